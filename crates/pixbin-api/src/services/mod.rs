pub mod captcha;

pub use captcha::{CaptchaVerifier, Verification};
