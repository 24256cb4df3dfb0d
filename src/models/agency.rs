//! Modelo de Agency
//!
//! Sucursal física donde se reciben y entregan envíos.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Agency {
    pub id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub province: String,
    pub lat: f64,
    pub lng: f64,
}
