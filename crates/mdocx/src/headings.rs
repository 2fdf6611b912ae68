//! Line-oriented heading rewriting for Markdown sources.
//!
//! These utilities operate on raw Markdown text and are independent of the
//! structural conversion engine. Numbering removal is a best-effort pipeline
//! of ordered patterns rather than a grammar; overlapping prefix styles are
//! handled in a fixed order and full coverage of every numbering convention
//! is not claimed.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use log::warn;
use regex::{Captures, Regex};

use crate::{Error, Result};

fn heading_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(#{1,6})(\s*)(.+)$").unwrap())
}

/// Shift every heading one level up; `#` stays `#`.
pub fn upgrade(content: &str) -> String {
    heading_line()
        .replace_all(content, |caps: &Captures| {
            let hashes = &caps[1];
            let hashes = if hashes.len() > 1 {
                &hashes[1..]
            } else {
                hashes
            };
            format!("{hashes}{}{}", &caps[2], &caps[3])
        })
        .into_owned()
}

/// Shift every heading one level down; `######` stays `######`.
pub fn downgrade(content: &str) -> String {
    heading_line()
        .replace_all(content, |caps: &Captures| {
            let hashes = if caps[1].len() < 6 {
                format!("#{}", &caps[1])
            } else {
                caps[1].to_string()
            };
            format!("{hashes}{}{}", &caps[2], &caps[3])
        })
        .into_owned()
}

/// The ordered numbering-prefix patterns, applied one after another to each
/// heading's text. Order matters: multi-level decimal prefixes must go
/// before single letters, Chinese enumerations before their parenthesized
/// forms.
fn strip_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // Chinese enumerations: 一、 二、
            r"^([一二三四五六七八九十百千万]+、)+",
            // Chinese upper-case enumerations: 壹、 贰、
            r"^([壹贰叁肆伍陆柒捌玖拾佰仟万]+、)+",
            // Roman numerals with a dot: I. IV.
            r"(?i)^[IVXLCDM]+\.\s*",
            // Decimal, possibly multi-level: 1. 1.1. 2.3.4
            r"^(\d+\.)*\d+\.?\s*",
            // Decimal with letter tail: 1.1.A
            r"^(\d+\.)*(\d+\.[A-Za-z])+\s*",
            // Parenthesized decimal: (1)
            r"^\(\d+\)\s*",
            // Parenthesized Chinese: (一)
            r"^\([一二三四五六七八九十百千万]+\)\s*",
            // Full-width enumerated decimal: 1、
            r"^(\d+、)+",
            // Parenthesized Roman: (I)
            r"(?i)^\([IVXLCDM]+\)\s*",
            // Single letters: A. b.
            r"^[A-Za-z]\.\s*",
            // Dotted letter chains: .A.A
            r"^(\.[A-Za-z])+\s*",
            // Parenthesized letters: (A)
            r"^\([A-Za-z]\)\s*",
            // Closing-bracket forms: 1） 一）
            r"^(\d+|[一二三四五六七八九十百千万]+)）\s*",
            // Chinese book/chapter prefixes: 第一篇 第一章
            r"^第[一二三四五六七八九十百千万]+篇",
            r"^第[一二三四五六七八九十百千万]+章",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).unwrap())
        .collect()
    })
}

/// Remove recognized numbering prefixes from every heading.
pub fn strip_numbering(content: &str) -> String {
    heading_line()
        .replace_all(content, |caps: &Captures| {
            let mut text = caps[3].to_string();
            for pattern in strip_patterns() {
                text = pattern.replace(&text, "").into_owned();
            }
            format!("{}{}{}", &caps[1], &caps[2], text.trim())
        })
        .into_owned()
}

/// Preset numbering schemes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum NumberingScheme {
    /// Technical documentation: `1.` `1.1` `1.1.1`
    #[default]
    Tech,
    /// Academic paper: `I.` `1.1` `1.1.1.A`
    Academic,
    /// Chinese bidding document: `一、` `1.1` `1.1.1`
    ChineseBidding,
    /// Chinese book: `第一篇` `1.1` `1.1.1`
    ChineseBook,
}

impl NumberingScheme {
    fn templates(self) -> [&'static str; 6] {
        match self {
            NumberingScheme::Tech => [
                "{level1} ",
                "{level1}.{level2} ",
                "{level1}.{level2}.{level3} ",
                "{level1}.{level2}.{level3}.{level4} ",
                "{level1}.{level2}.{level3}.{level4}.{level5} ",
                "{level1}.{level2}.{level3}.{level4}.{level5}.{level6} ",
            ],
            NumberingScheme::Academic => [
                "{level1:roman}. ",
                "{level1}.{level2} ",
                "{level1}.{level2}.{level3} ",
                "{level1}.{level2}.{level3}.{level4:alpha} ",
                "{level1}.{level2}.{level3}.{level4:alpha}.{level5:alpha} ",
                "{level1}.{level2}.{level3}.{level4:alpha}.{level5:alpha}.{level6:alpha} ",
            ],
            NumberingScheme::ChineseBidding => [
                "{level1:chinese}、",
                "{level1}.{level2} ",
                "{level1}.{level2}.{level3} ",
                "{level1}.{level2}.{level3}.{level4} ",
                "{level1}.{level2}.{level3}.{level4}.{level5} ",
                "{level1}.{level2}.{level3}.{level4}.{level5}.{level6} ",
            ],
            NumberingScheme::ChineseBook => [
                "第{level1:chinese}篇 ",
                "{level1}.{level2} ",
                "{level1}.{level2}.{level3} ",
                "{level1}.{level2}.{level3}.{level4} ",
                "{level1}.{level2}.{level3}.{level4}.{level5} ",
                "{level1}.{level2}.{level3}.{level4}.{level5}.{level6} ",
            ],
        }
    }
}

/// Number every heading according to `scheme`, replacing any existing
/// numbering first.
pub fn add_numbering(content: &str, scheme: NumberingScheme) -> String {
    let templates: BTreeMap<u8, String> = scheme
        .templates()
        .iter()
        .enumerate()
        .map(|(index, template)| (index as u8 + 1, (*template).to_string()))
        .collect();
    add_numbering_with(content, &templates)
}

/// Number headings using per-level templates with `{levelN}` and
/// `{levelN:format}` placeholders.
pub fn add_numbering_with(content: &str, templates: &BTreeMap<u8, String>) -> String {
    let stripped = strip_numbering(content);
    let mut counters: BTreeMap<u8, u32> = BTreeMap::new();
    heading_line()
        .replace_all(&stripped, |caps: &Captures| {
            let level = caps[1].len() as u8;
            counters.entry(level).and_modify(|c| *c += 1).or_insert(1);
            // Parents a document skipped still count from one.
            for parent in 1..level {
                counters.entry(parent).or_insert(1);
            }
            // A heading resets everything nested below it.
            counters.retain(|&l, _| l <= level);

            let template = templates
                .get(&level)
                .cloned()
                .unwrap_or_else(|| format!("{{level{level}}} "));
            let numbering = render_template(&template, &counters);
            format!("{}{}{}{}", &caps[1], &caps[2], numbering, &caps[3])
        })
        .into_owned()
}

/// Load per-level templates from a JSON object keyed by heading level.
/// Non-numeric keys are skipped with a warning, matching the lenient
/// behavior of the command line.
pub fn templates_from_json(json: &str) -> Result<BTreeMap<u8, String>> {
    let raw: BTreeMap<String, String> = serde_json::from_str(json)
        .map_err(|e| Error::from(format!("invalid numbering template: {e}")))?;
    let mut templates = BTreeMap::new();
    for (key, value) in raw {
        match key.parse::<u8>() {
            Ok(level) => {
                templates.insert(level, value);
            }
            Err(_) => warn!("ignoring invalid heading level {key:?} in numbering template"),
        }
    }
    Ok(templates)
}

fn render_template(template: &str, counters: &BTreeMap<u8, u32>) -> String {
    static WITH_FORMAT: OnceLock<Regex> = OnceLock::new();
    static SIMPLE: OnceLock<Regex> = OnceLock::new();
    let with_format =
        WITH_FORMAT.get_or_init(|| Regex::new(r"\{level(\d+):([a-z_]+)\}").unwrap());
    let simple = SIMPLE.get_or_init(|| Regex::new(r"\{level(\d+)\}").unwrap());

    let rendered = with_format.replace_all(template, |caps: &Captures| {
        let Some(count) = lookup(counters, &caps[1]) else {
            return caps[0].to_string();
        };
        match &caps[2] {
            "chinese" => number_to_chinese(count),
            "chinese_upper" => number_to_chinese_upper(count),
            "roman" => number_to_roman(count),
            "alpha" => number_to_alpha(count, true),
            "alpha_lower" => number_to_alpha(count, false),
            _ => count.to_string(),
        }
    });
    simple
        .replace_all(&rendered, |caps: &Captures| {
            lookup(counters, &caps[1]).map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

fn lookup(counters: &BTreeMap<u8, u32>, level: &str) -> Option<u32> {
    level
        .parse::<u8>()
        .ok()
        .and_then(|level| counters.get(&level).copied())
}

/// Chinese numerals (一、二、三…) for the range the numbering schemes use.
fn number_to_chinese(num: u32) -> String {
    const DIGITS: [&str; 10] = ["", "一", "二", "三", "四", "五", "六", "七", "八", "九"];
    const UNITS: [&str; 5] = ["", "十", "百", "千", "万"];
    if num == 0 {
        return "零".to_string();
    }

    let digits: Vec<usize> = num
        .to_string()
        .chars()
        .map(|c| c.to_digit(10).unwrap_or(0) as usize)
        .collect();
    let length = digits.len();
    let mut result = String::new();
    let mut pending_zero = false;
    for (i, &digit) in digits.iter().enumerate() {
        let place = length - i - 1;
        if digit == 0 {
            pending_zero = true;
        } else {
            if pending_zero {
                result.push('零');
                pending_zero = false;
            }
            result.push_str(DIGITS[digit]);
            result.push_str(UNITS[place]);
        }
    }

    // 一十三 reads as 十三.
    if (10..=19).contains(&num) {
        result = result.chars().skip(1).collect();
    }
    result
}

/// Upper-case Chinese numerals (壹、贰、叁…).
fn number_to_chinese_upper(num: u32) -> String {
    const DIGITS: [&str; 10] = ["", "壹", "贰", "叁", "肆", "伍", "陆", "柒", "捌", "玖"];
    const UNITS: [&str; 5] = ["", "拾", "佰", "仟", "万"];
    if num == 0 {
        return "零".to_string();
    }

    let digits: Vec<usize> = num
        .to_string()
        .chars()
        .map(|c| c.to_digit(10).unwrap_or(0) as usize)
        .collect();
    let length = digits.len();
    let mut result = String::new();
    for (i, &digit) in digits.iter().enumerate() {
        let place = length - i - 1;
        if digit == 0 {
            if !result.is_empty() && !result.ends_with('零') {
                result.push('零');
            }
        } else {
            if result.ends_with('零') && place > 0 {
                result.pop();
            }
            result.push_str(DIGITS[digit]);
            result.push_str(UNITS[place]);
        }
    }

    if (10..=19).contains(&num) {
        let chars: Vec<char> = result.chars().collect();
        result = if chars.len() > 2 {
            format!("拾{}", chars[2..].iter().collect::<String>())
        } else {
            "拾".to_string()
        };
    }
    result
}

/// Roman numerals; out-of-range values fall back to decimal digits.
fn number_to_roman(num: u32) -> String {
    const NUMERALS: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    if num == 0 || num >= 4000 {
        return num.to_string();
    }

    let mut remaining = num;
    let mut result = String::new();
    for (value, symbol) in NUMERALS {
        while remaining >= value {
            result.push_str(symbol);
            remaining -= value;
        }
    }
    result
}

/// Alphabetic numbering; out-of-range values fall back to decimal digits.
fn number_to_alpha(num: u32, uppercase: bool) -> String {
    if num == 0 || num > 26 {
        return num.to_string();
    }
    let base = if uppercase { b'A' } else { b'a' };
    char::from(base + (num as u8) - 1).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upgrade_saturates_at_h1() {
        assert_eq!(upgrade("# top\n## sub"), "# top\n# sub");
    }

    #[test]
    fn downgrade_saturates_at_h6() {
        assert_eq!(downgrade("# top\n###### deep"), "## top\n###### deep");
    }

    #[test]
    fn upgrade_then_downgrade_is_identity_on_interior_levels() {
        let source = "## a\n### b\n#### c";
        assert_eq!(downgrade(&upgrade(source)), source);
    }

    #[test]
    fn strip_removes_common_prefixes() {
        assert_eq!(strip_numbering("# 1. Intro"), "# Intro");
        assert_eq!(strip_numbering("## 1.2.3 Detail"), "## Detail");
        assert_eq!(strip_numbering("# 一、总则"), "# 总则");
        assert_eq!(strip_numbering("# (一) 范围"), "# 范围");
        assert_eq!(strip_numbering("# 第一章 绪论"), "# 绪论");
        assert_eq!(strip_numbering("## (2) item"), "## item");
    }

    #[test]
    fn strip_leaves_unnumbered_headings_alone() {
        assert_eq!(strip_numbering("# Overview"), "# Overview");
        assert_eq!(strip_numbering("plain text"), "plain text");
    }

    #[test]
    fn tech_numbering_counts_hierarchically() {
        let source = "# a\n## b\n## c\n### d\n# e\n## f";
        insta::assert_snapshot!(add_numbering(source, NumberingScheme::Tech), @r"
        # 1 a
        ## 1.1 b
        ## 1.2 c
        ### 1.2.1 d
        # 2 e
        ## 2.1 f
        ");
    }

    #[test]
    fn chinese_bidding_numbering_uses_chinese_first_level() {
        let source = "# 总则\n## 范围";
        insta::assert_snapshot!(
            add_numbering(source, NumberingScheme::ChineseBidding),
            @r"
        # 一、总则
        ## 1.1 范围
        "
        );
    }

    #[test]
    fn academic_numbering_uses_roman_first_level() {
        let numbered = add_numbering("# one\n# two", NumberingScheme::Academic);
        assert_eq!(numbered, "# I. one\n# II. two");
    }

    #[test]
    fn existing_numbering_is_replaced() {
        let numbered = add_numbering("# 3. old", NumberingScheme::Tech);
        assert_eq!(numbered, "# 1 old");
    }

    #[test]
    fn chinese_numerals_cover_the_teens() {
        assert_eq!(number_to_chinese(1), "一");
        assert_eq!(number_to_chinese(10), "十");
        assert_eq!(number_to_chinese(13), "十三");
        assert_eq!(number_to_chinese(21), "二十一");
    }

    #[test]
    fn roman_and_alpha_renderers() {
        assert_eq!(number_to_roman(4), "IV");
        assert_eq!(number_to_roman(1994), "MCMXCIV");
        assert_eq!(number_to_alpha(1, true), "A");
        assert_eq!(number_to_alpha(3, false), "c");
        assert_eq!(number_to_alpha(27, true), "27");
    }

    #[test]
    fn custom_templates_load_from_json() {
        let templates =
            templates_from_json(r#"{"1": "{level1:alpha}) ", "2": "{level1}-{level2} "}"#)
                .expect("valid json");
        let numbered = add_numbering_with("# a\n## b", &templates);
        assert_eq!(numbered, "# A) a\n## 1-1 b");
    }
}
