#[cfg(test)]
mod tests {
    use jira_kpi::libs::secret::Secret;
    use std::fs;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct SecretTestContext {
        _temp_dir: TempDir,
        prompt: String,
    }

    impl TestContext for SecretTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            std::env::set_var("HOME", temp_dir.path());
            std::env::set_var("LOCALAPPDATA", temp_dir.path());

            SecretTestContext {
                _temp_dir: temp_dir,
                prompt: "Enter your Jira API token".to_string(),
            }
        }
    }

    #[test_context(SecretTestContext)]
    #[test]
    fn test_store_and_read(ctx: &mut SecretTestContext) {
        let secret = Secret::new(".roundtrip_secret", &ctx.prompt);

        secret.store("api-token-123").unwrap();

        assert!(secret.path().exists());
        assert_ne!(fs::read_to_string(secret.path()).unwrap(), "api-token-123");
        assert_eq!(secret.read().unwrap(), "api-token-123");
        assert_eq!(secret.get_or_prompt().unwrap(), "api-token-123");
    }

    #[test_context(SecretTestContext)]
    #[test]
    fn test_clear(ctx: &mut SecretTestContext) {
        let secret = Secret::new(".cleared_secret", &ctx.prompt);
        secret.store("value").unwrap();

        secret.clear().unwrap();

        assert!(!secret.path().exists());
        secret.clear().unwrap();
    }

    #[test_context(SecretTestContext)]
    #[test]
    fn test_corrupted_secret_file(ctx: &mut SecretTestContext) {
        let secret = Secret::new(".corrupted_secret", &ctx.prompt);
        fs::create_dir_all(secret.path().parent().unwrap()).unwrap();
        fs::write(secret.path(), "invalid_base64_content!@#$").unwrap();

        assert!(secret.read().is_err());
    }
}
