//! The map page served at `/`.
//!
//! Rendered once at start-up from the `map` config section. Everything
//! dynamic happens in the browser: the page asks for the viewer's position,
//! polls `/data`, and replaces all spawn markers on every poll.

use chrono_tz::Tz;
use spawnmap_core::config::MapConfig;

/// Leaflet release the page loads.
const LEAFLET: &str = "https://unpkg.com/leaflet@1.9.4/dist";

/// Render the page for `map`, formatting expiry times in `zone`.
#[allow(clippy::too_many_lines)]
pub fn render(map: &MapConfig, zone: Tz) -> String {
    let center_lat = map.center_lat;
    let center_lon = map.center_lon;
    let zoom = map.zoom;
    let refresh_ms = u64::from(map.refresh_secs).saturating_mul(1000);
    // JSON string literals double as safe JS string literals.
    let zone = serde_json::Value::from(zone.name()).to_string();
    let user_icon = serde_json::Value::from(map.user_icon.as_str()).to_string();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <title>Live Spawn Map</title>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <style>html, body, #map {{ height: 100%; margin: 0; }}</style>
  <link rel="stylesheet" href="{LEAFLET}/leaflet.css" />
</head>
<body>
<div id="map"></div>
<script src="{LEAFLET}/leaflet.js"></script>
<script>
const TIME_ZONE = {zone};
const USER_ICON = {user_icon};

const map = L.map('map').setView([{center_lat}, {center_lon}], {zoom});
L.tileLayer('https://tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
  attribution: '&copy; OpenStreetMap contributors'
}}).addTo(map);

let markers = [];
let userMarker = null;
let userPos = null;

function formatExpiry(expires) {{
  return new Date(expires).toLocaleTimeString("en-US", {{
    hour: "numeric",
    minute: "2-digit",
    second: "2-digit",
    timeZone: TIME_ZONE,
    timeZoneName: "short"
  }});
}}

function routeLink(spawn) {{
  const dest = `daddr=${{spawn.lat}},${{spawn.lon}}`;
  const from = userPos ? `saddr=${{userPos[0]}},${{userPos[1]}}&` : "";
  return `<a href="https://maps.apple.com/?${{from}}${{dest}}" target="_blank">Apple Maps Route</a>`;
}}

function placeUser(lat, lon) {{
  userPos = [lat, lon];
  if (!userMarker) {{
    userMarker = L.marker(userPos, {{
      icon: L.icon({{ iconUrl: USER_ICON, iconSize: [32, 32] }}),
      title: "You are here"
    }}).addTo(map);
  }} else {{
    userMarker.setLatLng(userPos);
  }}
}}

function drawSpawns(spawns) {{
  markers.forEach(m => map.removeLayer(m));
  markers = [];
  spawns.forEach(spawn => {{
    const icon = L.icon({{ iconUrl: spawn.icon, iconSize: [48, 48] }});
    const popup = `<b>${{spawn.name}}</b><br>Expires at: ${{formatExpiry(spawn.expires)}}<br>${{routeLink(spawn)}}`;
    markers.push(L.marker([spawn.lat, spawn.lon], {{ icon }}).bindPopup(popup).addTo(map));
  }});
}}

function fetchSpawns() {{
  fetch('/data')
    .then(res => res.json())
    .then(drawSpawns)
    .catch(err => console.error("spawn refresh failed", err));
}}

function updateMap() {{
  if (!navigator.geolocation) {{
    fetchSpawns();
    return;
  }}
  navigator.geolocation.getCurrentPosition(
    pos => {{
      placeUser(pos.coords.latitude, pos.coords.longitude);
      fetchSpawns();
    }},
    () => fetchSpawns()
  );
}}

updateMap();
setInterval(updateMap, {refresh_ms});
</script>
</body>
</html>
"#
    )
}
