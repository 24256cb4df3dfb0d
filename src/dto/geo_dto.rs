use serde::Deserialize;

// Query para la agencia más cercana
#[derive(Debug, Clone, Deserialize)]
pub struct NearestAgencyQuery {
    pub lat: f64,
    pub lng: f64,
}
