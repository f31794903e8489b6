pub mod application;
pub mod availability;
pub mod booking;
pub mod cleaner;
pub mod company;
pub mod invite;
pub mod review;
pub mod service;
pub mod service_area;
pub mod user;

pub use application::{Application, ApplicationDocuments, ApplicationStatus, ApplicationType, CompanyInfo};
pub use availability::{Availability, AvailabilityType, TimeWindow};
pub use booking::{Booking, BookingAction, BookingStatus};
pub use cleaner::{CleanerProfile, Tier};
pub use company::{Company, CompanyType};
pub use invite::{CleanerInvite, InviteStatus};
pub use review::{Review, ReviewStatus, Transaction, TransactionStatus};
pub use service::{Frequency, ServiceAddOn, ServiceAddOnDefinition, ServiceDefinition, ServiceType};
pub use service_area::{Address, ServiceArea};
pub use user::{Role, User};
