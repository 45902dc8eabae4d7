//! Request parameters for the market and util routes.
//!
//! GET requests carry them in the query string, POST requests in headers
//! of the same name. A list parameter may be given comma separated
//! (`id=1,2`), repeated (`id=1&id=2`) or in brackets (`id=[1,2]`).

use actix_web::{dev::Payload, http::Method, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use std::collections::HashMap;

use crate::error::GatewayError;

#[derive(Debug, Default, Clone)]
pub struct MarketParams {
    /// Lower-cased name -> every value given for it.
    values: HashMap<String, Vec<String>>,
}

impl MarketParams {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut values: HashMap<String, Vec<String>> = HashMap::new();
        for (name, raw) in pairs {
            let entry = values.entry(name.as_ref().to_lowercase()).or_default();
            entry.extend(
                raw.as_ref()
                    .trim()
                    .trim_start_matches('[')
                    .trim_end_matches(']')
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_owned),
            );
        }
        Self { values }
    }

    fn read(req: &HttpRequest) -> Self {
        if req.method() == Method::POST {
            Self::from_pairs(
                req.headers()
                    .iter()
                    .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?))),
            )
        } else {
            Self::from_pairs(url::form_urlencoded::parse(req.query_string().as_bytes()))
        }
    }

    pub fn list(&self, name: &str) -> &[String] {
        self.values
            .get(&name.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.list(name).first().map(String::as_str)
    }

    /// Every value of `name` as a number; absent means empty.
    pub fn ints(&self, name: &str) -> Result<Vec<i64>, GatewayError> {
        self.list(name).iter().map(|v| number(name, v)).collect()
    }

    /// At least one number for `name`.
    pub fn required_ints(&self, name: &str) -> Result<Vec<i64>, GatewayError> {
        let ints = self.ints(name)?;
        if ints.is_empty() {
            return Err(GatewayError::BadRequest(format!("missing `{name}`")));
        }
        Ok(ints)
    }

    pub fn opt_int(&self, name: &str) -> Result<Option<i64>, GatewayError> {
        self.opt_str(name).map(|v| number(name, v)).transpose()
    }

    pub fn int(&self, name: &str) -> Result<i64, GatewayError> {
        self.opt_int(name)?
            .ok_or_else(|| GatewayError::BadRequest(format!("missing `{name}`")))
    }
}

fn number(name: &str, raw: &str) -> Result<i64, GatewayError> {
    raw.parse()
        .map_err(|_| GatewayError::BadRequest(format!("`{name}` must be a number, got `{raw}`")))
}

impl FromRequest for MarketParams {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _pl: &mut Payload) -> Self::Future {
        ready(Ok(Self::read(req)))
    }
}
