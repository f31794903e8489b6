use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::{Address, User};
use crate::services::bookings::AddressInput;

pub fn my_addresses(conn: &Connection, user: &User) -> AppResult<Vec<Address>> {
    Ok(queries::list_addresses(conn, &user.id)?)
}

/// Adds an address book entry. The first entry becomes the default.
pub fn add_address(conn: &Connection, user: &User, input: &AddressInput, now: NaiveDateTime) -> AppResult<Address> {
    if input.street.trim().is_empty() || input.city.trim().is_empty() {
        return Err(AppError::validation("street and city are required"));
    }
    let is_first = queries::list_addresses(conn, &user.id)?.is_empty();
    let address = Address {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        street: input.street.trim().to_string(),
        city: input.city.trim().to_string(),
        neighborhood: input.neighborhood.clone(),
        postal_code: input.postal_code.clone(),
        is_default: is_first,
        created_at: now,
    };
    queries::create_address(conn, &address)?;
    Ok(address)
}

pub fn make_default(conn: &mut Connection, user: &User, address_id: &str) -> AppResult<Vec<Address>> {
    if !queries::set_default_address(conn, &user.id, address_id)? {
        return Err(AppError::NotFound("address"));
    }
    my_addresses(conn, user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::Role;

    fn seed(conn: &Connection) -> User {
        let now = db::now();
        let user = User {
            id: "u1".to_string(),
            email: "u1@example.com".to_string(),
            first_name: "Ioana".to_string(),
            last_name: "Pop".to_string(),
            phone: None,
            role: Role::Client,
            created_at: now,
            updated_at: now,
        };
        queries::create_user(conn, &user).unwrap();
        user
    }

    fn input(street: &str) -> AddressInput {
        AddressInput {
            street: street.to_string(),
            city: "Cluj-Napoca".to_string(),
            neighborhood: Some("Gheorgheni".to_string()),
            postal_code: None,
        }
    }

    #[test]
    fn test_first_address_is_default_and_default_moves() {
        let mut conn = db::init_db(":memory:").unwrap();
        let user = seed(&conn);

        let home = add_address(&conn, &user, &input("Str. Mare 1"), db::now()).unwrap();
        let office = add_address(&conn, &user, &input("Str. Mica 2"), db::now()).unwrap();
        assert!(home.is_default);
        assert!(!office.is_default);

        let list = make_default(&mut conn, &user, &office.id).unwrap();
        let defaults: Vec<_> = list.iter().filter(|a| a.is_default).map(|a| a.id.as_str()).collect();
        assert_eq!(defaults, vec![office.id.as_str()]);
    }

    #[test]
    fn test_foreign_or_blank_addresses_rejected() {
        let mut conn = db::init_db(":memory:").unwrap();
        let user = seed(&conn);

        let err = add_address(&conn, &user, &input("  "), db::now()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = make_default(&mut conn, &user, "missing").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
