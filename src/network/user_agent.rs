//! Browser header profile for page fetches

use rand::seq::SliceRandom;

/// Desktop platforms paired with the browser builds that ship on them
const PLATFORMS: &[&str] = &[
    "Windows NT 10.0; Win64; x64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "X11; Linux x86_64",
];

const CHROME_BUILDS: &[&str] = &["124.0.0.0", "125.0.0.0", "126.0.0.0"];
const FIREFOX_BUILDS: &[&str] = &["126.0", "127.0"];

/// Pick a realistic desktop user agent
///
/// Chosen once per client so every request of a process looks like the same
/// browser.
pub fn generate_user_agent() -> String {
    let mut rng = rand::thread_rng();
    let platform = PLATFORMS.choose(&mut rng).copied().unwrap_or(PLATFORMS[0]);

    // Chrome is picked twice as often as Firefox
    let engines = ["chrome", "chrome", "firefox"];
    match engines.choose(&mut rng).copied() {
        Some("firefox") => {
            let build = FIREFOX_BUILDS.choose(&mut rng).copied().unwrap_or(FIREFOX_BUILDS[0]);
            format!("Mozilla/5.0 ({platform}; rv:{build}) Gecko/20100101 Firefox/{build}")
        }
        _ => {
            let build = CHROME_BUILDS.choose(&mut rng).copied().unwrap_or(CHROME_BUILDS[0]);
            format!(
                "Mozilla/5.0 ({platform}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{build} Safari/537.36"
            )
        }
    }
}

/// Accept header a browser sends for a top-level navigation
pub fn accept_html() -> &'static str {
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"
}

/// Accept-Language value for a configured language tag
///
/// `all` or an empty tag means plain English. A regional tag such as `de-AT`
/// also lists its base language before the English fallback.
pub fn accept_language(lang: &str) -> String {
    let lang = lang.trim();
    if lang.is_empty() || lang.eq_ignore_ascii_case("all") {
        return "en-US,en;q=0.9".to_string();
    }

    match lang.split_once('-') {
        Some((base, _)) if !base.eq_ignore_ascii_case("en") => {
            format!("{lang},{base};q=0.9,en;q=0.8")
        }
        _ => format!("{lang},en;q=0.8"),
    }
}
