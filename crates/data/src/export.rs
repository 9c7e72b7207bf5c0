use atmos_core::domain::records::{LocationRecord, WeatherRecord};
use anyhow::Context;

/// Flat export of saved locations and weather records, one row per record.
pub fn to_csv(
    locations: &[LocationRecord],
    weather: &[WeatherRecord],
) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    wtr.write_record(["type", "id", "query_or_kind", "lat", "lng", "created_at"])
        .context("write csv header failed")?;

    for loc in locations {
        let id = loc.id.to_string();
        let lat = loc.lat.to_string();
        let lng = loc.lng.to_string();
        let created_at = loc.created_at.to_rfc3339();
        wtr.write_record([
            "location",
            id.as_str(),
            loc.query.as_str(),
            lat.as_str(),
            lng.as_str(),
            created_at.as_str(),
        ])
        .context("write csv location row failed")?;
    }

    for rec in weather {
        let id = rec.id.to_string();
        let lat = rec.lat.to_string();
        let lng = rec.lng.to_string();
        let created_at = rec.created_at.to_rfc3339();
        wtr.write_record([
            "weather",
            id.as_str(),
            rec.kind.as_str(),
            lat.as_str(),
            lng.as_str(),
            created_at.as_str(),
        ])
        .context("write csv weather row failed")?;
    }

    let bytes = wtr.into_inner().context("flush csv writer failed")?;
    String::from_utf8(bytes).context("csv output was not utf-8")
}

pub fn to_markdown(locations: &[LocationRecord], weather: &[WeatherRecord]) -> String {
    let mut md = String::from("# Exported Data\n\n## Locations\n");
    for loc in locations {
        md.push_str(&format!(
            "- {}: {} ({},{}) - {}\n",
            loc.id,
            loc.query,
            loc.lat,
            loc.lng,
            loc.created_at.to_rfc3339()
        ));
    }
    md.push_str("\n## Weather\n");
    for rec in weather {
        md.push_str(&format!(
            "- {}: {} @ ({},{}) - {}\n",
            rec.id,
            rec.kind,
            rec.lat,
            rec.lng,
            rec.created_at.to_rfc3339()
        ));
    }
    md
}

pub fn to_xml(locations: &[LocationRecord], weather: &[WeatherRecord]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<export>\n");

    xml.push_str("  <locations>\n");
    for loc in locations {
        xml.push_str(&format!("    <location id=\"{}\">\n", loc.id));
        push_element(&mut xml, "query", &loc.query);
        push_element(&mut xml, "lat", &loc.lat.to_string());
        push_element(&mut xml, "lng", &loc.lng.to_string());
        push_element(&mut xml, "created_at", &loc.created_at.to_rfc3339());
        xml.push_str("    </location>\n");
    }
    xml.push_str("  </locations>\n");

    xml.push_str("  <weather>\n");
    for rec in weather {
        xml.push_str(&format!("    <record id=\"{}\">\n", rec.id));
        push_element(&mut xml, "kind", &rec.kind);
        push_element(&mut xml, "lat", &rec.lat.to_string());
        push_element(&mut xml, "lng", &rec.lng.to_string());
        push_element(&mut xml, "created_at", &rec.created_at.to_rfc3339());
        xml.push_str("    </record>\n");
    }
    xml.push_str("  </weather>\n</export>\n");

    xml
}

fn push_element(out: &mut String, name: &str, value: &str) {
    out.push_str(&format!("      <{name}>{}</{name}>\n", xml_escape(value)));
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn fixture() -> (Vec<LocationRecord>, Vec<WeatherRecord>) {
        let created_at = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        let locations = vec![LocationRecord {
            id: 1,
            query: "toronto <east>".to_string(),
            lat: 43.6532,
            lng: -79.3832,
            display_name: Some("Toronto, ON, Canada".to_string()),
            source: Some("mock".to_string()),
            created_at,
        }];
        let weather = vec![WeatherRecord {
            id: 2,
            location_id: Some(1),
            lat: 43.6532,
            lng: -79.3832,
            snapshot: json!({"temp": 20.5}),
            kind: "current".to_string(),
            created_at,
        }];
        (locations, weather)
    }

    #[test]
    fn csv_has_header_and_one_row_per_record() {
        let (locations, weather) = fixture();
        let out = to_csv(&locations, &weather).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "type,id,query_or_kind,lat,lng,created_at");
        assert!(lines[1].starts_with("location,1,"));
        assert!(lines[2].starts_with("weather,2,current,"));
    }

    #[test]
    fn markdown_lists_both_sections() {
        let (locations, weather) = fixture();
        let out = to_markdown(&locations, &weather);
        assert!(out.contains("## Locations"));
        assert!(out.contains("- 1: toronto <east> (43.6532,-79.3832)"));
        assert!(out.contains("## Weather"));
        assert!(out.contains("- 2: current @ (43.6532,-79.3832)"));
    }

    #[test]
    fn xml_escapes_reserved_characters() {
        let (locations, weather) = fixture();
        let out = to_xml(&locations, &weather);
        assert!(out.contains("<query>toronto &lt;east&gt;</query>"));
        assert!(out.contains("<record id=\"2\">"));
        assert!(!out.contains("<east>"));
    }
}
