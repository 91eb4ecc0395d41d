//! Headless-browser token capture.
//!
//! Flow for one invocation:
//! 1. Start (or connect to) a WebDriver server and open Chrome.
//! 2. Install the request recorder on every new document.
//! 3. Open the login page, fill email and password, submit.
//! 4. Navigate to an authenticated content page.
//! 5. Poll the recorder until a GraphQL call with a bearer token appears.
//!
//! Every wait is bounded. The browser is quit and any spawned chromedriver
//! is killed whether capture succeeds or not.

use std::path::PathBuf;
use std::time::Duration;

use serde_json::json;
use thirtyfour::extensions::cdp::ChromeDevTools;
use thirtyfour::ChromeCapabilities;
use thirtyfour::prelude::*;

use super::capture::{READ_CAPTURED_JS, REQUEST_RECORDER_JS, parse_captured, select_bearer};
use super::{Authenticator, NO_TOKEN_MESSAGE, accept_token};
use crate::core::chromedriver::{self, ChromeDriverProcess, LAMBDA_CHROMEDRIVER_PATHS};
use crate::core::wait::poll_until;
use crate::core::{BearerToken, Credential};
use crate::error::{RsmError, Result};
use crate::storage::{Config, running_in_lambda};

/// Chrome binary shipped by the Lambda Chrome layer.
pub const LAMBDA_CHROME_BINARY: &str = "/opt/chrome/chrome";

const EMAIL_SELECTOR: &str = "input[id*='email']";
const PASSWORD_SELECTOR: &str = "input[type='password']";
const SUBMIT_SELECTOR: &str = "button[type='submit']";

/// Everything the browser flow needs, resolved from [`Config`].
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub login_url: String,
    pub content_url: String,
    pub webdriver_url: Option<String>,
    pub chromedriver_path: Option<PathBuf>,
    pub chromedriver_port: u16,
    pub chrome_binary: Option<PathBuf>,
    pub headless: bool,
    pub in_lambda: bool,
    pub step_timeout: Duration,
    pub capture_timeout: Duration,
    pub poll_interval: Duration,
}

impl BrowserSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let in_lambda = running_in_lambda();
        let first_student = config.account.student_ids.first().copied().unwrap_or_default();
        let chrome_binary = config
            .auth
            .chrome_binary
            .clone()
            .or_else(|| in_lambda.then(|| PathBuf::from(LAMBDA_CHROME_BINARY)));

        Self {
            login_url: config.portal.login_url(),
            content_url: config.portal.content_url(first_student),
            webdriver_url: config.auth.webdriver_url.clone(),
            chromedriver_path: config.auth.chromedriver_path.clone(),
            chromedriver_port: config.auth.chromedriver_port,
            chrome_binary,
            headless: config.auth.headless,
            in_lambda,
            step_timeout: config.auth.step_timeout(),
            capture_timeout: config.auth.capture_timeout(),
            poll_interval: config.auth.poll_interval(),
        }
    }

    /// Command-line switches passed to Chrome.
    #[must_use]
    pub fn chrome_args(&self) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        if self.headless {
            args.push("--headless=new".into());
        }
        args.extend(
            [
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--disable-gpu",
                "--window-size=1920,1080",
                "--disable-blink-features=AutomationControlled",
            ]
            .map(String::from),
        );
        if self.in_lambda {
            // Lambda only allows writes under /tmp.
            args.extend(
                [
                    "--single-process",
                    "--no-zygote",
                    "--user-data-dir=/tmp/chrome-user-data",
                    "--data-path=/tmp/chrome-data",
                    "--homedir=/tmp",
                    "--disk-cache-dir=/tmp/chrome-cache",
                ]
                .map(String::from),
            );
        }
        args
    }

    fn capabilities(&self) -> Result<ChromeCapabilities> {
        let mut caps = DesiredCapabilities::chrome();
        caps.add_chrome_option("args", self.chrome_args())
            .map_err(|e| webdriver_error("set chrome args", &e))?;
        if let Some(binary) = &self.chrome_binary {
            caps.add_chrome_option("binary", binary.display().to_string())
                .map_err(|e| webdriver_error("set chrome binary", &e))?;
        }
        Ok(caps)
    }
}

fn webdriver_error(step: &str, err: &WebDriverError) -> RsmError {
    RsmError::auth(format!("WebDriver failed to {step}: {err}"))
}

/// Strategy A: headless Chrome driven over WebDriver.
#[derive(Debug, Clone)]
pub struct BrowserAuthenticator {
    settings: BrowserSettings,
}

impl BrowserAuthenticator {
    #[must_use]
    pub const fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub const fn settings(&self) -> &BrowserSettings {
        &self.settings
    }

    async fn start_driver(&self) -> Result<(Option<ChromeDriverProcess>, String)> {
        if let Some(url) = &self.settings.webdriver_url {
            return Ok((None, url.clone()));
        }
        let candidates: &[&str] = if self.settings.in_lambda {
            LAMBDA_CHROMEDRIVER_PATHS
        } else {
            &[]
        };
        let binary = chromedriver::locate(self.settings.chromedriver_path.as_deref(), candidates)?;
        let process = ChromeDriverProcess::spawn(
            &binary,
            self.settings.chromedriver_port,
            self.settings.step_timeout,
            self.settings.poll_interval,
        )
        .await?;
        let url = process.url().to_string();
        Ok((Some(process), url))
    }

    async fn capture(&self, driver: &WebDriver, credential: &Credential) -> Result<BearerToken> {
        let s = &self.settings;

        let devtools = ChromeDevTools::new(driver.handle.clone());
        devtools
            .execute_cdp_with_params(
                "Page.addScriptToEvaluateOnNewDocument",
                json!({ "source": REQUEST_RECORDER_JS }),
            )
            .await
            .map_err(|e| webdriver_error("install request recorder", &e))?;

        tracing::info!(url = %s.login_url, "Opening login page");
        driver
            .goto(s.login_url.as_str())
            .await
            .map_err(|e| webdriver_error("open login page", &e))?;

        let email = driver
            .query(By::Css(EMAIL_SELECTOR))
            .wait(s.step_timeout, s.poll_interval)
            .first()
            .await
            .map_err(|e| webdriver_error("find email field", &e))?;
        email
            .send_keys(credential.account.as_str())
            .await
            .map_err(|e| webdriver_error("type email", &e))?;

        let password = driver
            .query(By::Css(PASSWORD_SELECTOR))
            .wait(s.step_timeout, s.poll_interval)
            .first()
            .await
            .map_err(|e| webdriver_error("find password field", &e))?;
        password
            .send_keys(credential.secret.as_str())
            .await
            .map_err(|e| webdriver_error("type password", &e))?;

        let submit = driver
            .query(By::Css(SUBMIT_SELECTOR))
            .wait(s.step_timeout, s.poll_interval)
            .first()
            .await
            .map_err(|e| webdriver_error("find submit button", &e))?;
        let before_submit = driver
            .current_url()
            .await
            .map_err(|e| webdriver_error("read current url", &e))?;

        submit
            .scroll_into_view()
            .await
            .map_err(|e| webdriver_error("scroll to submit button", &e))?;
        if let Err(e) = submit.click().await {
            tracing::debug!(error = %e, "Native click failed, clicking via script");
            let arg = submit
                .to_json()
                .map_err(|e| webdriver_error("reference submit button", &e))?;
            driver
                .execute("arguments[0].click();", vec![arg])
                .await
                .map_err(|e| webdriver_error("click submit button", &e))?;
        }

        let before_submit = &before_submit;
        let navigated = poll_until(s.step_timeout, s.poll_interval, move || async move {
            let url = driver
                .current_url()
                .await
                .map_err(|e| webdriver_error("read current url", &e))?;
            Ok((url != *before_submit).then_some(url))
        })
        .await?;
        match navigated {
            Some(url) => tracing::debug!(url = %url, "Login submitted"),
            None => tracing::warn!("Page did not navigate after login submit"),
        }

        tracing::info!(url = %s.content_url, "Opening content page");
        driver
            .goto(s.content_url.as_str())
            .await
            .map_err(|e| webdriver_error("open content page", &e))?;

        let token = poll_until(s.capture_timeout, s.poll_interval, move || async move {
            let ret = driver
                .execute(READ_CAPTURED_JS, Vec::new())
                .await
                .map_err(|e| webdriver_error("read recorded requests", &e))?;
            let captured = parse_captured(ret.json());
            Ok(select_bearer(&captured))
        })
        .await?;

        token.ok_or_else(|| {
            tracing::error!(
                timeout_secs = s.capture_timeout.as_secs(),
                "No GraphQL request carried a bearer token"
            );
            RsmError::auth(NO_TOKEN_MESSAGE)
        })
    }
}

impl Authenticator for BrowserAuthenticator {
    fn name(&self) -> &'static str {
        "browser"
    }

    async fn authenticate(&self, credential: &Credential) -> Result<BearerToken> {
        let (process, url) = self.start_driver().await?;
        let caps = self.settings.capabilities()?;

        let driver = WebDriver::new(url.as_str(), caps)
            .await
            .map_err(|e| RsmError::auth(format!("Failed to connect to WebDriver at {url}: {e}")))?;

        let result = self.capture(&driver, credential).await;

        if let Err(e) = driver.quit().await {
            tracing::warn!(error = %e, "Failed to quit browser");
        }
        drop(process);

        accept_token(self.name(), result?)
    }
}
