//! `wpa_supplicant.conf` rendering.

use ledtracker_core::WifiCredentials;

/// Render a complete `wpa_supplicant.conf` with a single network block.
///
/// SSIDs that cannot be written as a quoted string (embedded quotes or
/// non-printable bytes) are emitted in the unquoted hex form
/// `wpa_supplicant` also accepts. Open networks get `key_mgmt=NONE`.
pub fn render_wpa_supplicant(credentials: &WifiCredentials, country: &str) -> String {
    let mut out = String::new();
    out.push_str("ctrl_interface=DIR=/var/run/wpa_supplicant GROUP=netdev\n");
    out.push_str("update_config=1\n");
    out.push_str(&format!("country={}\n", country));
    out.push('\n');
    out.push_str("network={\n");
    out.push_str(&format!("    ssid={}\n", ssid_value(&credentials.ssid)));
    if credentials.is_open() {
        out.push_str("    key_mgmt=NONE\n");
    } else {
        out.push_str(&format!("    psk=\"{}\"\n", credentials.passphrase));
        out.push_str("    key_mgmt=WPA-PSK\n");
    }
    out.push_str("}\n");
    out
}

fn ssid_value(ssid: &str) -> String {
    let printable = ssid.bytes().all(|b| (0x20..0x7f).contains(&b) && b != b'"');
    if printable {
        format!("\"{}\"", ssid)
    } else {
        hex::encode(ssid.as_bytes())
    }
}
