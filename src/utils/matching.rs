//! Comparación de localidades
//!
//! Dos políticas distintas, ambas insensibles a mayúsculas:
//! - coincidencia exacta (rutas manuales: origen, paradas, destino)
//! - coincidencia por subcadena (zonas de transportistas)

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Igualdad exacta ignorando mayúsculas y espacios extremos
pub fn same_location(a: &str, b: &str) -> bool {
    let a = normalize(a);
    !a.is_empty() && a == normalize(b)
}

/// La zona contiene al valor o el valor contiene a la zona.
/// Un valor o zona vacíos nunca coinciden.
pub fn zone_matches(value: &str, zone: &str) -> bool {
    let value = normalize(value);
    let zone = normalize(zone);
    if value.is_empty() || zone.is_empty() {
        return false;
    }
    value.contains(&zone) || zone.contains(&value)
}

/// Ciudad o provincia coinciden con alguna de las zonas
pub fn any_zone_matches(city: &str, province: &str, zones: &[String]) -> bool {
    zones
        .iter()
        .any(|zone| zone_matches(city, zone) || zone_matches(province, zone))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_location() {
        assert!(same_location("Córdoba", " córdoba "));
        assert!(!same_location("Córdoba", "Córdoba Capital"));
        assert!(!same_location("", ""));
    }

    #[test]
    fn test_zone_matches_substring() {
        assert!(zone_matches("Córdoba Capital", "córdoba"));
        assert!(zone_matches("Rosario", "Gran Rosario"));
        assert!(!zone_matches("Mendoza", "Córdoba"));
        assert!(!zone_matches("", "Córdoba"));
    }

    #[test]
    fn test_any_zone_matches() {
        let zones = vec!["Córdoba".to_string(), "Villa María".to_string()];
        assert!(any_zone_matches("Río Cuarto", "Córdoba", &zones));
        assert!(any_zone_matches("Villa María", "", &zones));
        assert!(!any_zone_matches("Godoy Cruz", "Mendoza", &zones));
    }
}
