use std::fmt::Write;

use cityweather_core::{CityCandidate, WeatherSnapshot};

/// Numbered list of search results.
pub fn city_list(cities: &[CityCandidate]) -> String {
    if cities.is_empty() {
        return "No matching cities.".to_string();
    }

    let mut out = String::new();
    for (i, city) in cities.iter().enumerate() {
        let _ = writeln!(out, "{:>3}. {} ({:.2}, {:.2})", i + 1, city.display_name(), city.lat, city.lon);
    }
    out
}

pub fn weather(snapshot: &WeatherSnapshot) -> String {
    let location = &snapshot.location;
    let current = &snapshot.current;

    let mut out = String::new();
    let place = [location.name.as_str(), location.region.as_str(), location.country.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(out, "{place}");

    if !current.condition.text.is_empty() {
        let _ = writeln!(out, "  {}", current.condition.text);
    }
    let _ = writeln!(
        out,
        "  Temperature: {:.1}°C (feels like {:.1}°C)",
        current.temp_c, current.feelslike_c
    );
    let _ = writeln!(out, "  Humidity:    {}%", current.humidity);
    let _ = write!(out, "  Wind:        {:.1} km/h", current.wind_kph);
    if !current.wind_dir.is_empty() {
        let _ = write!(out, " {}", current.wind_dir);
    }
    if current.gust_kph > 0.0 {
        let _ = write!(out, " (gusts {:.1} km/h)", current.gust_kph);
    }
    out.push('\n');
    let _ = writeln!(out, "  Pressure:    {:.0} mb", current.pressure_mb);
    let _ = writeln!(out, "  UV index:    {:.1}", current.uv);

    if let Some(observed) = snapshot.observed_at() {
        let _ = writeln!(out, "  Updated:     {}", observed.format("%Y-%m-%d %H:%M UTC"));
    }
    if !location.localtime.is_empty() {
        let _ = writeln!(out, "  Local time:  {}", location.localtime);
    }

    out
}
