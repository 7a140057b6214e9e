use crate::errors::{JetError, Result};
use config::{Config, File, FileFormat, Value};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = ".jira_config";

/// Basic-auth material for one provider. Email wins over username when both are set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub email: Option<String>,
    pub username: Option<String>,
    pub token: Option<String>,
}

impl Credentials {
    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        let token = self.token.as_deref()?;
        self.email
            .as_deref()
            .or(self.username.as_deref())
            .map(|user| (user, token))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub url: String,
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Default)]
struct ProviderValues {
    url: Option<String>,
    email: Option<String>,
    username: Option<String>,
    token: Option<String>,
}

impl ProviderValues {
    fn from_env(env: &dyn Fn(&str) -> Option<String>, prefix: &str) -> Self {
        let get = |name: &str| env(&format!("{}_{}", prefix, name)).filter(|v| !v.is_empty());
        Self {
            url: get("URL"),
            email: get("EMAIL"),
            username: get("USERNAME"),
            token: get("API_TOKEN"),
        }
    }

    fn from_section(section: Option<&HashMap<String, String>>) -> Self {
        let Some(section) = section else {
            return Self::default();
        };
        let get = |name: &str| section.get(name).cloned().filter(|v| !v.is_empty());
        Self {
            url: get("url"),
            email: get("email"),
            username: get("username"),
            token: get("token"),
        }
    }

    fn or(self, fallback: ProviderValues) -> Self {
        Self {
            url: self.url.or(fallback.url),
            email: self.email.or(fallback.email),
            username: self.username.or(fallback.username),
            token: self.token.or(fallback.token),
        }
    }

    fn validate(&self, provider: &str, env_prefix: &str) -> Result<ProviderConfig> {
        let url = self.url.clone().ok_or_else(|| {
            JetError::ConfigInvalid(format!(
                "{} URL not configured. Set {}_URL or add 'url' to ~/{}",
                provider, env_prefix, CONFIG_FILE_NAME
            ))
        })?;

        let credentials = Credentials {
            email: self.email.clone(),
            username: self.username.clone(),
            token: self.token.clone(),
        };
        if credentials.basic_auth().is_none() {
            return Err(JetError::AuthMissing);
        }

        Ok(ProviderConfig { url, credentials })
    }
}

/// Settings for both providers, read once per invocation.
///
/// Environment variables take precedence over `~/.jira_config`. The wiki
/// provider falls back to the ticket provider's values, since both usually
/// live on the same Atlassian site with the same token.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    jira: ProviderValues,
    confluence: ProviderValues,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let env = |name: &str| std::env::var(name).ok();
        Self::load_with(&env)
    }

    /// Without a home directory only the environment is consulted.
    fn load_with(env: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let path = config_path_from(env);
        if path.is_none() {
            tracing::debug!("HOME not set; skipping {}", CONFIG_FILE_NAME);
        }
        Self::from_sources(env, path.as_deref())
    }

    pub fn from_sources(env: &dyn Fn(&str) -> Option<String>, file: Option<&Path>) -> Result<Self> {
        let sections = match file {
            Some(path) if path.exists() => load_sections(path)?,
            _ => HashMap::new(),
        };

        let jira = ProviderValues::from_env(env, "JIRA")
            .or(ProviderValues::from_section(sections.get("jira")));
        let confluence = ProviderValues::from_env(env, "CONFLUENCE")
            .or(ProviderValues::from_section(sections.get("confluence")))
            .or(jira.clone());

        Ok(Self { jira, confluence })
    }

    pub fn jira(&self) -> Result<ProviderConfig> {
        self.jira.validate("JIRA", "JIRA")
    }

    pub fn confluence(&self) -> Result<ProviderConfig> {
        self.confluence.validate("Confluence", "CONFLUENCE")
    }

    /// `~/.jira_config`, or `None` when there is no home directory.
    pub fn config_path() -> Option<PathBuf> {
        config_path_from(&|name: &str| std::env::var(name).ok())
    }

    /// Writes a `[jira]` section to `path`, readable by the owner only.
    ///
    /// Values are written verbatim; `load_sections` reads them back the same way.
    pub fn save_jira_section(path: &Path, values: &[(&str, &str)]) -> Result<()> {
        let mut body = String::from("[jira]\n");
        for (key, value) in values.iter().filter(|(_, v)| !v.is_empty()) {
            body.push_str(&format!("{} = {}\n", key, value));
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path)?;

        // An existing file keeps its old mode on open; fix it before the token lands.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }

        file.write_all(body.as_bytes())?;
        Ok(())
    }
}

fn config_path_from(env: &dyn Fn(&str) -> Option<String>) -> Option<PathBuf> {
    env("HOME")
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(CONFIG_FILE_NAME))
}

fn load_sections(path: &Path) -> Result<HashMap<String, HashMap<String, String>>> {
    tighten_permissions(path)?;

    // The INI parser treats `\` as an escape; double it so values stay literal.
    let raw = std::fs::read_to_string(path)?;
    let literal = raw.replace('\\', "\\\\");

    let config = Config::builder()
        .add_source(File::from_str(&literal, FileFormat::Ini))
        .build()
        .map_err(|e| JetError::ConfigInvalid(format!("failed to load config file: {}", e)))?;

    let root: HashMap<String, Value> = config
        .try_deserialize()
        .map_err(|e| JetError::ConfigInvalid(format!("failed to parse config file: {}", e)))?;

    let mut sections = HashMap::new();
    for (name, value) in root {
        // Entries outside any [section] are plain strings; skip them.
        let Ok(table) = value.into_table() else {
            continue;
        };
        let entries = table
            .into_iter()
            .filter_map(|(key, value)| {
                let raw = value.into_string().ok()?;
                Some((key.to_lowercase(), strip_quotes(raw.trim()).to_string()))
            })
            .collect();
        sections.insert(name.to_lowercase(), entries);
    }

    Ok(sections)
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(unix)]
fn tighten_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)?.permissions();
    if perms.mode() & 0o077 == 0 {
        return Ok(());
    }

    perms.set_mode(0o600);
    std::fs::set_permissions(path, perms).map_err(|e| {
        JetError::ConfigInvalid(format!(
            "config file has insecure permissions and could not be fixed: {}",
            e
        ))
    })?;
    tracing::warn!("Fixed insecure permissions on {} (now 0600)", path.display());
    Ok(())
}

#[cfg(not(unix))]
fn tighten_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_env_only() {
        let env = env_from(&[
            ("JIRA_URL", "https://acme.atlassian.net"),
            ("JIRA_EMAIL", "dev@acme.io"),
            ("JIRA_API_TOKEN", "secret"),
        ]);
        let settings = Settings::from_sources(&env, None).unwrap();
        let jira = settings.jira().unwrap();
        assert_eq!(jira.url, "https://acme.atlassian.net");
        assert_eq!(jira.credentials.basic_auth(), Some(("dev@acme.io", "secret")));
    }

    #[test]
    fn test_load_without_home_uses_env() {
        let env = env_from(&[
            ("JIRA_URL", "https://acme.atlassian.net"),
            ("JIRA_EMAIL", "dev@acme.io"),
            ("JIRA_API_TOKEN", "secret"),
        ]);
        let settings = Settings::load_with(&env).unwrap();
        let jira = settings.jira().unwrap();
        assert_eq!(jira.url, "https://acme.atlassian.net");
        assert_eq!(jira.credentials.basic_auth(), Some(("dev@acme.io", "secret")));

        let empty_home = env_from(&[("HOME", ""), ("JIRA_URL", "https://acme.atlassian.net")]);
        assert!(Settings::load_with(&empty_home).is_ok());
    }

    #[test]
    fn test_load_reads_config_under_home() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".jira_config"),
            "[jira]\nurl = https://home.atlassian.net\nemail = dev@acme.io\ntoken = t\n",
        )
        .unwrap();
        let home = dir.path().to_string_lossy().to_string();
        let env = env_from(&[("HOME", home.as_str())]);
        let settings = Settings::load_with(&env).unwrap();
        assert_eq!(settings.jira().unwrap().url, "https://home.atlassian.net");
    }

    #[test]
    fn test_email_preferred_over_username() {
        let creds = Credentials {
            email: Some("dev@acme.io".into()),
            username: Some("dev".into()),
            token: Some("t".into()),
        };
        assert_eq!(creds.basic_auth(), Some(("dev@acme.io", "t")));

        let creds = Credentials {
            email: None,
            username: Some("dev".into()),
            token: Some("t".into()),
        };
        assert_eq!(creds.basic_auth(), Some(("dev", "t")));
    }

    #[test]
    fn test_missing_token_is_auth_missing() {
        let env = env_from(&[("JIRA_URL", "https://acme.atlassian.net"), ("JIRA_EMAIL", "a@b.c")]);
        let settings = Settings::from_sources(&env, None).unwrap();
        assert!(matches!(settings.jira(), Err(JetError::AuthMissing)));
    }

    #[test]
    fn test_missing_url_is_config_error() {
        let env = env_from(&[("JIRA_EMAIL", "a@b.c"), ("JIRA_API_TOKEN", "t")]);
        let settings = Settings::from_sources(&env, None).unwrap();
        assert!(matches!(settings.jira(), Err(JetError::ConfigInvalid(_))));
    }

    #[test]
    fn test_file_fallback_and_env_precedence() {
        let file = write_config(
            "[JIRA]\nurl = \"https://file.atlassian.net\"\nusername = 'filer'\ntoken = filetoken\n",
        );
        let env = env_from(&[("JIRA_API_TOKEN", "envtoken")]);
        let settings = Settings::from_sources(&env, Some(file.path())).unwrap();
        let jira = settings.jira().unwrap();
        assert_eq!(jira.url, "https://file.atlassian.net");
        assert_eq!(jira.credentials.basic_auth(), Some(("filer", "envtoken")));
    }

    #[test]
    fn test_confluence_falls_back_to_jira() {
        let file = write_config(
            "[jira]\nurl = https://acme.atlassian.net\nemail = dev@acme.io\ntoken = t\n\n[confluence]\nurl = https://wiki.acme.io\n",
        );
        let env = env_from(&[]);
        let settings = Settings::from_sources(&env, Some(file.path())).unwrap();
        let wiki = settings.confluence().unwrap();
        assert_eq!(wiki.url, "https://wiki.acme.io");
        assert_eq!(wiki.credentials.basic_auth(), Some(("dev@acme.io", "t")));
    }

    #[cfg(unix)]
    #[test]
    fn test_permissive_file_is_tightened() {
        use std::os::unix::fs::PermissionsExt;

        let file = write_config("[jira]\nurl = https://acme.atlassian.net\n");
        let mut perms = std::fs::metadata(file.path()).unwrap().permissions();
        perms.set_mode(0o644);
        std::fs::set_permissions(file.path(), perms).unwrap();

        let env = env_from(&[]);
        Settings::from_sources(&env, Some(file.path())).unwrap();

        let mode = std::fs::metadata(file.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_save_jira_section_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jet.ini");
        Settings::save_jira_section(
            &path,
            &[
                ("url", "https://acme.atlassian.net"),
                ("email", "dev@acme.io"),
                ("username", ""),
                ("token", "t"),
            ],
        )
        .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("[jira]\n"));
        assert!(!contents.contains("username"));

        let env = env_from(&[]);
        let settings = Settings::from_sources(&env, Some(&path)).unwrap();
        assert_eq!(settings.jira().unwrap().url, "https://acme.atlassian.net");
    }

    #[test]
    fn test_backslashes_survive_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jet.ini");
        Settings::save_jira_section(
            &path,
            &[
                ("url", "https://jira.corp.example"),
                ("username", r"CORP\jdoe"),
                ("token", r"AbC;d#e=f\g"),
            ],
        )
        .unwrap();

        let env = env_from(&[]);
        let jira = Settings::from_sources(&env, Some(&path)).unwrap().jira().unwrap();
        assert_eq!(jira.credentials.basic_auth(), Some((r"CORP\jdoe", r"AbC;d#e=f\g")));
    }

    #[test]
    fn test_hand_written_backslash_is_literal() {
        let file = write_config("[jira]\nurl = https://jira.corp.example\nusername = CORP\\jdoe\ntoken = t\n");
        let env = env_from(&[]);
        let jira = Settings::from_sources(&env, Some(file.path())).unwrap().jira().unwrap();
        assert_eq!(jira.credentials.username.as_deref(), Some(r"CORP\jdoe"));
    }

    #[cfg(unix)]
    #[test]
    fn test_save_restricts_existing_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jet.ini");
        std::fs::write(&path, "[jira]\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        Settings::save_jira_section(&path, &[("token", "t")]).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        let fresh = dir.path().join("fresh.ini");
        Settings::save_jira_section(&fresh, &[("token", "t")]).unwrap();
        let mode = std::fs::metadata(&fresh).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
