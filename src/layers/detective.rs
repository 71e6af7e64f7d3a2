use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptionsBuilder};
use scraper::{Html, Selector};

use crate::core::types::{DomAnalysis, L2Result};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; ctsentinel/1.0)";

const CREDENTIAL_INPUT_HINTS: [&str; 8] = [
    "email", "user", "login", "phone", "mobile", "id", "card", "password",
];

const SUSPICIOUS_SUBMIT_TARGETS: [&str; 7] = [
    "google.com/forms",
    "forms.gle",
    "bit.ly",
    "tinyurl",
    "script.google.com",
    "webhook",
    "discord.com/api",
];

/// Renders and inspects one fqdn. Once the browser subsystem has failed once
/// it is latched off for the lifetime of the process; every later call goes
/// straight to the HTTP fallback.
pub struct Detective {
    browser_broken: Arc<AtomicBool>,
    browser_enabled: bool,
    thai_keywords: Vec<String>,
    http_client: reqwest::Client,
    budget: Duration,
    chrome_path: Option<PathBuf>,
}

impl Detective {
    pub fn new(browser_enabled: bool, thai_keywords: Vec<String>, budget_ms: u64) -> Self {
        Self::with_chrome_path(browser_enabled, thai_keywords, budget_ms, None)
    }

    /// Same as `new`, but pins a specific Chrome/Chromium binary instead of
    /// letting headless_chrome auto-discover one. Lets deployments on hosts
    /// without a discoverable browser point at one explicitly.
    pub fn with_chrome_path(
        browser_enabled: bool,
        thai_keywords: Vec<String>,
        budget_ms: u64,
        chrome_path: Option<PathBuf>,
    ) -> Self {
        let http_client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()
            .expect("http client builds with fixed options");

        Detective {
            browser_broken: Arc::new(AtomicBool::new(false)),
            browser_enabled,
            thai_keywords,
            http_client,
            budget: Duration::from_millis(budget_ms),
            chrome_path,
        }
    }

    pub async fn analyze(&self, fqdn: &str) -> L2Result {
        self.analyze_url(&format!("https://{}", fqdn)).await
    }

    /// Same as `analyze`, but takes a full URL. Exists so tests can point
    /// the HTTP fallback path at a local mock server.
    pub async fn analyze_url(&self, url: &str) -> L2Result {
        if self.browser_enabled && !self.browser_broken.load(Ordering::Relaxed) {
            let url_owned = url.to_string();
            let thai_keywords = self.thai_keywords.clone();
            let chrome_path = self.chrome_path.clone();
            let rendered = tokio::time::timeout(
                self.budget,
                tokio::task::spawn_blocking(move || {
                    render(&url_owned, &thai_keywords, chrome_path.as_deref())
                }),
            )
            .await;

            match rendered {
                Ok(Ok(Ok(mut result))) => {
                    self.score_dom(&mut result);
                    return result;
                }
                _ => {
                    // Covers a render error, a panicked blocking task, and a
                    // budget timeout alike: any of these means the browser
                    // path can't be trusted for the rest of this process.
                    self.browser_broken.store(true, Ordering::Relaxed);
                }
            }
        }

        let mut result = self.http_fallback(url).await;
        result.used_http_fallback = true;
        self.score_dom(&mut result);
        result
    }

    async fn http_fallback(&self, url: &str) -> L2Result {
        match self.http_client.get(url).send().await {
            Ok(resp) => {
                let status_ok = resp.status().is_success() || resp.status().is_redirection();
                let body = resp.text().await.unwrap_or_default();
                let truncated: String = body.chars().take(50 * 1024).collect();
                L2Result {
                    page_accessible: status_ok,
                    used_http_fallback: true,
                    redirect_chain: vec![],
                    screenshot: None,
                    dom: parse_dom(&truncated, &self.thai_keywords),
                    score: 0,
                    factors: vec![],
                }
            }
            Err(_) => L2Result {
                page_accessible: false,
                used_http_fallback: true,
                ..Default::default()
            },
        }
    }

    fn score_dom(&self, result: &mut L2Result) {
        let dom = &result.dom;
        let mut score: i32 = 0;
        let mut factors = Vec::new();

        if dom.has_login_form {
            score += 25;
            factors.push("Contains login form".to_string());
        }
        if dom.has_password_field {
            score += 20;
            factors.push("Has password input field".to_string());
        }
        if !dom.thai_keywords_found.is_empty() {
            let preview: Vec<&String> = dom.thai_keywords_found.iter().take(5).collect();
            score += 15;
            factors.push(format!(
                "Thai phishing keywords: {}",
                preview
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        for action in &dom.form_action_urls {
            if SUSPICIOUS_SUBMIT_TARGETS.iter().any(|t| action.contains(t)) {
                score += 20;
                factors.push(format!("Suspicious form submission target: {}", action));
            }
        }

        result.score = score.clamp(0, 100) as u8;
        result.factors = factors;
    }
}

/// Runs on a blocking thread pool thread; owns everything it touches so it
/// can be moved into `spawn_blocking`.
fn render(url: &str, thai_keywords: &[String], chrome_path: Option<&std::path::Path>) -> Result<L2Result, String> {
    let ua_arg = format!("--user-agent={}", USER_AGENT);
    let launch_options = LaunchOptionsBuilder::default()
        .args(vec![OsStr::new(ua_arg.as_str())])
        .path(chrome_path.map(|p| p.to_path_buf()))
        .build()
        .map_err(|e| e.to_string())?;
    let browser = Browser::new(launch_options).map_err(|e| e.to_string())?;
    let tab = browser.new_tab().map_err(|e| e.to_string())?;
    tab.navigate_to(url).map_err(|e| e.to_string())?;
    tab.wait_until_navigated().map_err(|e| e.to_string())?;
    std::thread::sleep(Duration::from_secs(1));

    let final_url = tab.get_url();
    let html = tab.get_content().map_err(|e| e.to_string())?;
    let screenshot = tab
        .capture_screenshot(
            headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption::Png,
            None,
            None,
            true,
        )
        .ok();

    Ok(L2Result {
        page_accessible: true,
        used_http_fallback: false,
        redirect_chain: if final_url != *url {
            vec![url.to_string(), final_url]
        } else {
            vec![]
        },
        screenshot,
        dom: parse_dom(&html, thai_keywords),
        score: 0,
        factors: vec![],
    })
}

fn parse_dom(html: &str, thai_keywords: &[String]) -> DomAnalysis {
    let document = Html::parse_document(html);
    let mut dom = DomAnalysis::default();

    if let Ok(title_sel) = Selector::parse("title") {
        dom.title = document
            .select(&title_sel)
            .next()
            .map(|e| e.text().collect::<String>())
            .unwrap_or_default();
    }

    if let Ok(meta_sel) = Selector::parse(r#"meta[name="description"]"#) {
        dom.description = document
            .select(&meta_sel)
            .next()
            .and_then(|e| e.value().attr("content"))
            .unwrap_or_default()
            .to_string();
    }

    if let Ok(form_sel) = Selector::parse("form") {
        let forms: Vec<_> = document.select(&form_sel).collect();
        dom.form_count = forms.len();
        let input_sel = Selector::parse("input").ok();
        for form in forms {
            let action = form.value().attr("action").unwrap_or("").to_string();
            dom.form_action_urls.push(action);
            if let Some(ref input_sel) = input_sel {
                for input in form.select(input_sel) {
                    let input_type = input.value().attr("type").unwrap_or("text");
                    let name = input.value().attr("name").unwrap_or("");
                    let placeholder = input.value().attr("placeholder").unwrap_or("");
                    dom.input_descriptors
                        .push(format!("{}:{}:{}", input_type, name, placeholder));
                    if input_type.eq_ignore_ascii_case("password") {
                        dom.has_password_field = true;
                        dom.has_login_form = true;
                    }
                    let combined = format!("{} {}", name, placeholder).to_lowercase();
                    if CREDENTIAL_INPUT_HINTS.iter().any(|h| combined.contains(h)) {
                        dom.has_login_form = true;
                    }
                }
            }
        }
    }

    let body_lower = html.to_lowercase();
    dom.visible_text = html.chars().take(5 * 1024).collect();
    for keyword in thai_keywords {
        if body_lower.contains(&keyword.to_lowercase()) {
            dom.thai_keywords_found.push(keyword.clone());
        }
    }

    dom
}
