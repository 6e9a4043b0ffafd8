//! API key pool for the email finder.
//!
//! The key with the most remaining credits is used first so load spreads
//! across accounts. Credits are refreshed from each successful response.

use crate::config::ApiKeyConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    pub key: String,
    pub credits: i64,
    pub active: bool,
}

impl From<&ApiKeyConfig> for ApiKey {
    fn from(cfg: &ApiKeyConfig) -> Self {
        Self {
            key: cfg.key.clone(),
            credits: cfg.credits,
            active: cfg.status.eq_ignore_ascii_case("active"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct KeyPool {
    keys: Vec<ApiKey>,
}

impl KeyPool {
    pub fn new(keys: Vec<ApiKey>) -> Self {
        Self { keys }
    }

    pub fn from_config(keys: &[ApiKeyConfig]) -> Self {
        Self::new(keys.iter().map(ApiKey::from).collect())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.keys.iter().filter(|k| k.active).count()
    }

    /// Index of the active key with the most credits; earliest wins ties.
    pub fn select(&self) -> Option<usize> {
        self.keys
            .iter()
            .enumerate()
            .filter(|(_, k)| k.active)
            .min_by_key(|(i, k)| (std::cmp::Reverse(k.credits), *i))
            .map(|(i, _)| i)
    }

    pub fn key(&self, idx: usize) -> Option<&ApiKey> {
        self.keys.get(idx)
    }

    pub fn update_credits(&mut self, idx: usize, remaining: i64) {
        if let Some(key) = self.keys.get_mut(idx) {
            key.credits = remaining;
        }
    }

    /// Key prefixes safe to print in logs.
    pub fn masked(&self) -> Vec<String> {
        self.keys
            .iter()
            .map(|k| {
                let prefix: String = k.key.chars().take(10).collect();
                format!("{}***", prefix)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(k: &str, credits: i64, active: bool) -> ApiKey {
        ApiKey {
            key: k.to_string(),
            credits,
            active,
        }
    }

    #[test]
    fn test_select_most_credits() {
        let pool = KeyPool::new(vec![key("a", 10, true), key("b", 40, true), key("c", 25, true)]);
        assert_eq!(pool.select(), Some(1));
    }

    #[test]
    fn test_select_ties_take_earliest() {
        let pool = KeyPool::new(vec![key("a", 5, true), key("b", 20, true), key("c", 20, true)]);
        assert_eq!(pool.select(), Some(1));
    }

    #[test]
    fn test_select_skips_inactive() {
        let pool = KeyPool::new(vec![key("a", 99, false), key("b", 1, true)]);
        assert_eq!(pool.select(), Some(1));
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn test_select_none_active() {
        let pool = KeyPool::new(vec![key("a", 99, false)]);
        assert_eq!(pool.select(), None);
        assert_eq!(KeyPool::default().select(), None);
    }

    #[test]
    fn test_update_credits_moves_selection() {
        let mut pool = KeyPool::new(vec![key("a", 30, true), key("b", 20, true)]);
        assert_eq!(pool.select(), Some(0));
        pool.update_credits(0, 10);
        assert_eq!(pool.select(), Some(1));
    }

    #[test]
    fn test_from_config_status() {
        let pool = KeyPool::from_config(&[
            ApiKeyConfig {
                key: "k1".into(),
                credits: 3,
                status: "Active".into(),
            },
            ApiKeyConfig {
                key: "k2".into(),
                credits: 9,
                status: "exhausted".into(),
            },
        ]);
        assert_eq!(pool.select(), Some(0));
    }

    #[test]
    fn test_masked_keys() {
        let pool = KeyPool::new(vec![key("abcdefghijklmnop", 0, true)]);
        assert_eq!(pool.masked(), vec!["abcdefghij***".to_string()]);
    }
}
