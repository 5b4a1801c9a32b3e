//! 매핑 테이블 -- 레이블 키와 네트워크 이름의 대응 규칙
//!
//! 시작 시 환경변수에서 한 번 만들어지고 이후 변경되지 않습니다.
//!
//! # 환경변수 형식
//! ```text
//! AUTONET_1_KEY=autonet.pangolin
//! AUTONET_1_NET=pangolin
//! AUTONET_7_KEY=autonet.media     # 번호 사이의 공백은 허용
//! AUTONET_7_NET=media_net
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::error::ConfigError;

/// 규칙 환경변수 접두어
pub const RULE_VAR_PREFIX: &str = "AUTONET_";

/// (레이블 키, 네트워크 이름) 규칙 하나
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    /// 설정 상의 순번 (`AUTONET_<index>_*`)
    pub index: u32,
    /// 컨테이너에 붙어 있어야 하는 레이블 키
    pub label_key: String,
    /// 연결 대상 네트워크 이름
    pub network: String,
}

impl Rule {
    /// 새 규칙을 생성합니다.
    pub fn new(index: u32, label_key: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            index,
            label_key: label_key.into(),
            network: network.into(),
        }
    }

    fn is_complete(&self) -> bool {
        !self.label_key.trim().is_empty() && !self.network.trim().is_empty()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} label='{}' -> network='{}'",
            self.index, self.label_key, self.network
        )
    }
}

/// 순번 순으로 정렬된 규칙 집합
#[derive(Debug, Clone, Serialize)]
pub struct MappingTable {
    rules: Vec<Rule>,
}

#[derive(Debug, Clone, Copy)]
enum RulePart {
    Key,
    Net,
}

impl MappingTable {
    /// 환경변수 목록에서 규칙을 읽어 들입니다.
    ///
    /// `AUTONET_<N>_KEY` / `AUTONET_<N>_NET` 형태의 변수를 모두 훑으며,
    /// 두 값 중 하나라도 비어 있는 순번은 경고를 남기고 건너뜁니다.
    /// 남은 규칙이 없으면 [`ConfigError::NoValidRules`]를 반환합니다.
    pub fn load<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut pairs: BTreeMap<u32, (Option<String>, Option<String>)> = BTreeMap::new();

        for (name, value) in vars {
            let Some((index, part)) = parse_rule_var(name.as_ref()) else {
                continue;
            };
            let value = value.as_ref().trim();
            let value = (!value.is_empty()).then(|| value.to_owned());
            let entry = pairs.entry(index).or_default();
            match part {
                RulePart::Key => entry.0 = value,
                RulePart::Net => entry.1 = value,
            }
        }

        let mut rules = Vec::with_capacity(pairs.len());
        for (index, pair) in pairs {
            match pair {
                (Some(label_key), Some(network)) => rules.push(Rule {
                    index,
                    label_key,
                    network,
                }),
                (key, net) => warn!(
                    index,
                    key_set = key.is_some(),
                    net_set = net.is_some(),
                    "AUTONET_{index}_KEY / AUTONET_{index}_NET not both set, ignoring index {index}"
                ),
            }
        }

        if rules.is_empty() {
            return Err(ConfigError::NoValidRules);
        }
        Ok(Self { rules })
    }

    /// 이미 만들어진 규칙 목록으로 테이블을 구성합니다.
    ///
    /// 불완전한 규칙은 경고 후 제외되고, 결과는 순번 순으로 정렬됩니다.
    pub fn new(rules: Vec<Rule>) -> Result<Self, ConfigError> {
        let mut rules: Vec<Rule> = rules
            .into_iter()
            .filter(|rule| {
                let complete = rule.is_complete();
                if !complete {
                    warn!(index = rule.index, "incomplete rule, ignoring");
                }
                complete
            })
            .collect();
        if rules.is_empty() {
            return Err(ConfigError::NoValidRules);
        }
        rules.sort_by_key(|rule| rule.index);
        Ok(Self { rules })
    }

    /// 규칙 목록 (순번 순)
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// 규칙 수
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// 규칙이 없는지 여부 (정상적으로 생성된 테이블은 항상 false)
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 규칙이 참조하는 네트워크 이름 (중복 제거, 처음 등장한 순서)
    pub fn networks(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for rule in &self.rules {
            if !seen.contains(&rule.network.as_str()) {
                seen.push(rule.network.as_str());
            }
        }
        seen
    }

    /// 규칙 순회
    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }
}

impl<'a> IntoIterator for &'a MappingTable {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// `AUTONET_<N>_KEY` / `AUTONET_<N>_NET` 이름을 (N, 종류)로 분해합니다.
fn parse_rule_var(name: &str) -> Option<(u32, RulePart)> {
    let rest = name.strip_prefix(RULE_VAR_PREFIX)?;
    let (index, suffix) = rest.split_once('_')?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index = index.parse::<u32>().ok()?;
    let part = match suffix {
        "KEY" => RulePart::Key,
        "NET" => RulePart::Net,
        _ => return None,
    };
    Some((index, part))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn load_reads_indexed_pairs_in_order() {
        let table = MappingTable::load(vars(&[
            ("AUTONET_2_NET", "media_net"),
            ("AUTONET_1_KEY", "autonet.pangolin"),
            ("AUTONET_2_KEY", "autonet.media"),
            ("AUTONET_1_NET", "pangolin"),
            ("PATH", "/usr/bin"),
        ]))
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rules()[0], Rule::new(1, "autonet.pangolin", "pangolin"));
        assert_eq!(table.rules()[1], Rule::new(2, "autonet.media", "media_net"));
    }

    #[test]
    fn load_drops_index_with_missing_network() {
        let table = MappingTable::load(vars(&[
            ("AUTONET_1_KEY", "autonet.pangolin"),
            ("AUTONET_1_NET", "pangolin"),
            ("AUTONET_3_KEY", "autonet.orphan"),
        ]))
        .unwrap();

        assert_eq!(table.len(), 1);
        assert!(table.iter().all(|rule| rule.index != 3));
    }

    #[test]
    fn load_treats_blank_values_as_missing() {
        let table = MappingTable::load(vars(&[
            ("AUTONET_1_KEY", "autonet.a"),
            ("AUTONET_1_NET", "   "),
            ("AUTONET_2_KEY", "autonet.b"),
            ("AUTONET_2_NET", "net_b"),
        ]))
        .unwrap();
        assert_eq!(table.networks(), vec!["net_b"]);
    }

    #[test]
    fn load_trims_values() {
        let table = MappingTable::load(vars(&[
            ("AUTONET_1_KEY", "  autonet.a "),
            ("AUTONET_1_NET", " net_a\n"),
        ]))
        .unwrap();
        assert_eq!(table.rules()[0].label_key, "autonet.a");
        assert_eq!(table.rules()[0].network, "net_a");
    }

    #[test]
    fn load_allows_gaps_in_numbering() {
        let table = MappingTable::load(vars(&[
            ("AUTONET_10_KEY", "autonet.late"),
            ("AUTONET_10_NET", "late"),
            ("AUTONET_1_KEY", "autonet.early"),
            ("AUTONET_1_NET", "early"),
        ]))
        .unwrap();
        let indices: Vec<u32> = table.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 10]);
    }

    #[test]
    fn load_fails_without_valid_rules() {
        let err = MappingTable::load(vars(&[("AUTONET_1_KEY", "autonet.a")])).unwrap_err();
        assert!(matches!(err, ConfigError::NoValidRules));

        let err = MappingTable::load(Vec::<(String, String)>::new()).unwrap_err();
        assert!(matches!(err, ConfigError::NoValidRules));
    }

    #[test]
    fn parse_rule_var_ignores_unrelated_names() {
        assert!(parse_rule_var("AUTONET_RESCAN_SECONDS").is_none());
        assert!(parse_rule_var("AUTONET_1_KEYS").is_none());
        assert!(parse_rule_var("AUTONET__KEY").is_none());
        assert!(parse_rule_var("AUTONET_-1_KEY").is_none());
        assert!(parse_rule_var("XAUTONET_1_KEY").is_none());
        assert!(matches!(
            parse_rule_var("AUTONET_42_NET"),
            Some((42, RulePart::Net))
        ));
    }

    #[test]
    fn networks_are_distinct_in_first_appearance_order() {
        let table = MappingTable::new(vec![
            Rule::new(3, "c", "shared"),
            Rule::new(1, "a", "pangolin"),
            Rule::new(2, "b", "shared"),
        ])
        .unwrap();
        assert_eq!(table.networks(), vec!["pangolin", "shared"]);
    }

    #[test]
    fn new_drops_incomplete_rules_and_sorts() {
        let table = MappingTable::new(vec![
            Rule::new(5, "e", "net_e"),
            Rule::new(2, "", "net_b"),
            Rule::new(1, "a", "net_a"),
        ])
        .unwrap();
        let indices: Vec<u32> = table.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 5]);
    }

    #[test]
    fn rule_display() {
        let rule = Rule::new(1, "autonet.pangolin", "pangolin");
        assert_eq!(
            rule.to_string(),
            "#1 label='autonet.pangolin' -> network='pangolin'"
        );
    }
}
