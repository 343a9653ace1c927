//! OS accent color lookup.
//!
//! Colors are returned as lowercase `rrggbbaa` hex. Platforms without a
//! system accent (Linux desktops) report `None`; no fallback is invented.

/// Read the current accent color from the OS.
pub fn system_accent_color() -> Option<String> {
    #[cfg(target_os = "windows")]
    {
        use std::os::windows::process::CommandExt;
        use std::process::Command;

        let output = Command::new("reg")
            .args(["query", r"HKCU\Software\Microsoft\Windows\DWM", "/v", "AccentColor"])
            .creation_flags(0x08000000) // CREATE_NO_WINDOW
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        parse_dwm_accent(&String::from_utf8_lossy(&output.stdout))
    }

    #[cfg(target_os = "macos")]
    {
        use std::process::Command;

        let output = Command::new("defaults")
            .args(["read", "-g", "AppleAccentColor"])
            .output()
            .ok()?;
        // The key is absent while the default (multicolor) accent is selected.
        let index = if output.status.success() {
            String::from_utf8_lossy(&output.stdout).trim().parse::<i32>().ok()?
        } else {
            MAC_DEFAULT_ACCENT
        };
        mac_accent_for_index(index).map(str::to_string)
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        None
    }
}

#[cfg(any(target_os = "windows", test))]
/// Parse `reg query` output for the DWM `AccentColor` DWORD, stored as
/// `0xAABBGGRR`.
pub fn parse_dwm_accent(output: &str) -> Option<String> {
    let line = output.lines().find(|line| line.contains("AccentColor"))?;
    let raw = line.split_whitespace().last()?;
    let value = u32::from_str_radix(raw.trim_start_matches("0x").trim_start_matches("0X"), 16).ok()?;

    let [red, green, blue, alpha] = value.to_le_bytes();
    Some(format!("{:02x}{:02x}{:02x}{:02x}", red, green, blue, alpha))
}

#[cfg(any(target_os = "macos", test))]
pub const MAC_DEFAULT_ACCENT: i32 = 4;

#[cfg(any(target_os = "macos", test))]
/// `AppleAccentColor` index to the matching `controlAccentColor`.
pub fn mac_accent_for_index(index: i32) -> Option<&'static str> {
    match index {
        -1 => Some("989898ff"), // graphite
        0 => Some("e0383eff"),  // red
        1 => Some("f7821bff"),  // orange
        2 => Some("ffc600ff"),  // yellow
        3 => Some("62ba46ff"),  // green
        4 => Some("007affff"),  // blue
        5 => Some("953d96ff"),  // purple
        6 => Some("f74f9eff"),  // pink
        _ => None,
    }
}
