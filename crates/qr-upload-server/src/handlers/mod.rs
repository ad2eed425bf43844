pub mod health;
pub mod qr_session;
