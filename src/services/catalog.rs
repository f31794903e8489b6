use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::{ServiceAddOnDefinition, ServiceDefinition, User};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub services: Vec<ServiceDefinition>,
    #[serde(default)]
    pub add_ons: Vec<ServiceAddOnDefinition>,
}

pub fn load(conn: &Connection) -> AppResult<Catalog> {
    Ok(Catalog {
        services: queries::list_service_definitions(conn)?,
        add_ons: queries::list_add_on_definitions(conn)?,
    })
}

fn validate(update: &Catalog) -> AppResult<()> {
    for def in &update.services {
        if def.name.trim().is_empty() {
            return Err(AppError::validation("service name is required"));
        }
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(def.base_hours) || !positive(def.price_multiplier) {
            return Err(AppError::validation(format!(
                "{}: base hours and multiplier must be positive",
                def.service_type.as_str()
            )));
        }
    }
    for def in &update.add_ons {
        if def.fixed_price < 0 || !(def.estimated_hours.is_finite() && def.estimated_hours >= 0.0) {
            return Err(AppError::validation(format!(
                "{}: price and hours must be non-negative numbers",
                def.add_on.as_str()
            )));
        }
    }
    Ok(())
}

/// Inserts or replaces the given catalog rows. Rows not mentioned are left
/// untouched; retire an entry by sending it with `is_active: false`.
pub fn upsert(conn: &mut Connection, actor: &User, update: &Catalog) -> AppResult<Catalog> {
    if !actor.role.is_global_admin() {
        return Err(AppError::Forbidden);
    }
    validate(update)?;

    let tx = conn.transaction()?;
    for def in &update.services {
        queries::upsert_service_definition(&tx, def)?;
    }
    for def in &update.add_ons {
        queries::upsert_add_on_definition(&tx, def)?;
    }
    tx.commit()?;

    tracing::info!(
        services = update.services.len(),
        add_ons = update.add_ons.len(),
        "catalog updated"
    );
    load(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Role, ServiceType};

    fn admin() -> User {
        let now = db::now();
        User {
            id: "admin".to_string(),
            email: "admin@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Admin".to_string(),
            phone: None,
            role: Role::GlobalAdmin,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_upsert_and_retire() {
        let mut conn = db::init_db(":memory:").unwrap();
        let mut catalog = load(&conn).unwrap();
        let deep = catalog
            .services
            .iter_mut()
            .find(|s| s.service_type == ServiceType::DeepCleaning)
            .unwrap();
        deep.is_active = false;
        deep.price_multiplier = 1.25;
        let update = Catalog {
            services: vec![deep.clone()],
            add_ons: vec![],
        };

        let updated = upsert(&mut conn, &admin(), &update).unwrap();
        let deep = updated
            .services
            .iter()
            .find(|s| s.service_type == ServiceType::DeepCleaning)
            .unwrap();
        assert!(!deep.is_active);
        assert_eq!(deep.price_multiplier, 1.25);
        assert_eq!(updated.add_ons.len(), 7);
    }

    #[test]
    fn test_upsert_requires_admin_and_valid_rows() {
        let mut conn = db::init_db(":memory:").unwrap();
        let mut update = load(&conn).unwrap();
        update.services[0].base_hours = 0.0;

        let err = upsert(&mut conn, &admin(), &update).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let client = User {
            role: Role::Client,
            ..admin()
        };
        let err = upsert(&mut conn, &client, &Catalog::default()).unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[test]
    fn test_add_on_hours_must_be_a_number() {
        let mut conn = db::init_db(":memory:").unwrap();
        let before = load(&conn).unwrap();

        for hours in [f64::NAN, f64::INFINITY, -0.5] {
            let mut update = before.clone();
            update.add_ons[0].estimated_hours = hours;
            let err = upsert(&mut conn, &admin(), &update).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{hours} was accepted");
        }

        let after = load(&conn).unwrap();
        assert_eq!(after.add_ons[0].estimated_hours, before.add_ons[0].estimated_hours);
    }
}
