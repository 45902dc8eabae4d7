pub mod admin;
pub mod health;
pub mod legacy;
pub mod market;
pub mod params;
pub mod respond;
pub mod routes;
pub mod util;
