//! Servicio geográfico
//!
//! Localidades por provincia, distancia haversine, agencia más cercana y el
//! enlace de mapa de una hoja de ruta. Sólo se usa para presentación y
//! estimaciones; ninguna decisión de asignación depende de estas distancias.

use std::collections::BTreeMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use serde::Serialize;

use crate::models::Agency;
use crate::repositories::Store;
use crate::utils::errors::{AppError, AppResult, FieldError};

const EARTH_RADIUS_KM: f64 = 6371.0;
const MAPS_DIRECTIONS_URL: &str = "https://www.google.com/maps/dir/";

lazy_static! {
    static ref LOCALITIES: BTreeMap<&'static str, Vec<&'static str>> = {
        let mut m = BTreeMap::new();
        m.insert("Buenos Aires", vec!["La Plata", "Mar del Plata", "Bahía Blanca", "Tandil", "Quilmes", "Pilar"]);
        m.insert("CABA", vec!["Palermo", "Belgrano", "Caballito", "San Telmo", "Recoleta"]);
        m.insert("Córdoba", vec!["Córdoba", "Villa María", "Río Cuarto", "Carlos Paz", "San Francisco"]);
        m.insert("Santa Fe", vec!["Rosario", "Santa Fe", "Rafaela", "Venado Tuerto", "Reconquista"]);
        m.insert("Mendoza", vec!["Mendoza", "Godoy Cruz", "San Rafael", "Luján de Cuyo", "Maipú"]);
        m.insert("San Juan", vec!["San Juan", "Rawson", "Chimbas", "Rivadavia"]);
        m
    };
}

/// Ciudades conocidas agrupadas por provincia
pub fn localities_by_province() -> BTreeMap<String, Vec<String>> {
    LOCALITIES
        .iter()
        .map(|(province, cities)| {
            (
                province.to_string(),
                cities.iter().map(|c| c.to_string()).collect(),
            )
        })
        .collect()
}

/// Distancia en km entre dos coordenadas (fórmula de haversine)
pub fn distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Enlace de direcciones de Google Maps para origen -> paradas -> destino
pub fn route_map_url(waypoints: &[&str]) -> String {
    let path = waypoints
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .map(|w| urlencoding::encode(w).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}{}", MAPS_DIRECTIONS_URL, path)
}

/// Agencia más cercana con su distancia
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestAgency {
    pub agency: Agency,
    pub distance_km: f64,
}

pub fn nearest_of(lat: f64, lng: f64, agencies: Vec<Agency>) -> Option<NearestAgency> {
    agencies
        .into_iter()
        .map(|agency| {
            let distance_km = distance(lat, lng, agency.lat, agency.lng);
            NearestAgency { agency, distance_km }
        })
        .min_by(|a, b| a.distance_km.total_cmp(&b.distance_km))
}

pub struct GeoService {
    store: Arc<dyn Store>,
}

impl GeoService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn localities(&self) -> BTreeMap<String, Vec<String>> {
        localities_by_province()
    }

    pub async fn nearest_agency(&self, lat: f64, lng: f64) -> AppResult<Option<NearestAgency>> {
        let mut errors = Vec::new();
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            errors.push(FieldError::new("lat", "range", "La latitud debe estar entre -90 y 90"));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            errors.push(FieldError::new("lng", "range", "La longitud debe estar entre -180 y 180"));
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let nearest = nearest_of(lat, lng, self.store.get_agencies().await?);
        if let Some(n) = &nearest {
            log::debug!("📍 Agencia más cercana a ({}, {}): {} a {:.1} km", lat, lng, n.agency.name, n.distance_km);
        }
        Ok(nearest)
    }
}
