pub mod login;
pub mod otp;
pub mod password_reset;
pub mod register;
pub mod token;
