pub mod booking;
pub mod chart;
pub mod hold;
pub mod seat;

pub use booking::{Booking, BookingStatus};
pub use chart::{EarlyBird, SeatCategory, SeatingChart, Table, TableShape, Venue};
pub use hold::{Hold, HoldStatus, PriceLabel, PriceLine};
pub use seat::{Seat, SeatStatus};
