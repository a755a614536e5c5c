pub mod events;
pub mod health;
pub mod notification;
pub mod reference;
pub mod requests;
pub mod ui;
