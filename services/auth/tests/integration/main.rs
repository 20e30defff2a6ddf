mod otp_test;
mod password_reset_test;
mod token_test;
