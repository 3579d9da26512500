pub mod codes;
pub mod hash;
pub mod jwt;
pub mod logger;
pub mod validator;
