//! Reservation aggregate

pub mod model;
pub mod repository;

pub use model::Reservation;
pub use repository::ReservationRepository;
