pub mod comments;
pub mod opening_hours;
pub mod reservations;
pub mod restaurant_images;
pub mod restaurant_tables;
pub mod restaurants;

pub use comments::CreateComment;
pub use reservations::CreateReservation;
pub use restaurant_tables::CreateRestaurantTable;
pub use restaurants::{CreateRestaurant, RestaurantFilter};
