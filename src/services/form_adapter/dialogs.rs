//! 对话框识别
//!
//! 通过固定短语表识别页面弹窗。只有识别出的弹窗会被自动关闭，
//! 未识别的弹窗留在原处，作为阻塞条件交给调用方。

use std::fmt;
use std::sync::OnceLock;

use phf::phf_map;
use regex::Regex;
use serde::Serialize;

/// 已知的弹窗类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DialogKind {
    /// 操作成功
    Success,
    /// 一般警告
    Warning,
    /// 询问是否更新身份证号
    IdentityUpdate,
    /// 参保人未登记
    NotRegistered,
    /// 参保人状态无效
    Inactive,
    /// 该日期已登记过
    AlreadyRegistered,
}

impl DialogKind {
    /// 该弹窗是否意味着此编号无法提交
    pub fn blocks_submission(self) -> bool {
        matches!(
            self,
            DialogKind::NotRegistered | DialogKind::Inactive | DialogKind::AlreadyRegistered
        )
    }

    /// 多个短语同时命中时取优先级最高的
    fn priority(self) -> u8 {
        match self {
            DialogKind::NotRegistered => 6,
            DialogKind::Inactive => 5,
            DialogKind::AlreadyRegistered => 4,
            DialogKind::IdentityUpdate => 3,
            DialogKind::Warning => 2,
            DialogKind::Success => 1,
        }
    }
}

impl fmt::Display for DialogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DialogKind::Success => "success",
            DialogKind::Warning => "warning",
            DialogKind::IdentityUpdate => "identity-update",
            DialogKind::NotRegistered => "not-registered",
            DialogKind::Inactive => "inactive",
            DialogKind::AlreadyRegistered => "already-registered",
        };
        f.write_str(name)
    }
}

/// 短语表（小写）
static KNOWN_PHRASES: phf::Map<&'static str, DialogKind> = phf_map! {
    "berhasil" => DialogKind::Success,
    "sukses" => DialogKind::Success,
    "success" => DialogKind::Success,
    "peringatan" => DialogKind::Warning,
    "perhatian" => DialogKind::Warning,
    "warning" => DialogKind::Warning,
    "update nik" => DialogKind::IdentityUpdate,
    "perbarui nik" => DialogKind::IdentityUpdate,
    "tidak terdaftar" => DialogKind::NotRegistered,
    "belum terdaftar" => DialogKind::NotRegistered,
    "tidak ditemukan" => DialogKind::NotRegistered,
    "not registered" => DialogKind::NotRegistered,
    "tidak aktif" => DialogKind::Inactive,
    "non aktif" => DialogKind::Inactive,
    "nonaktif" => DialogKind::Inactive,
    "inactive" => DialogKind::Inactive,
    "sudah terdaftar" => DialogKind::AlreadyRegistered,
    "sudah didaftarkan" => DialogKind::AlreadyRegistered,
    "already registered" => DialogKind::AlreadyRegistered,
};

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// 规范化弹窗文本：小写、合并空白
pub fn normalize(text: &str) -> String {
    whitespace()
        .replace_all(text.trim(), " ")
        .to_lowercase()
}

/// 根据弹窗文本识别类型，无法识别时返回 None
pub fn classify(text: &str) -> Option<DialogKind> {
    let normalized = normalize(text);
    KNOWN_PHRASES
        .entries()
        .filter(|(phrase, _)| normalized.contains(*phrase))
        .map(|(_, kind)| *kind)
        .max_by_key(|kind| kind.priority())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_phrases() {
        assert_eq!(classify("Data berhasil disimpan"), Some(DialogKind::Success));
        assert_eq!(classify("PERINGATAN!"), Some(DialogKind::Warning));
        assert_eq!(
            classify("Peserta   tidak\nterdaftar"),
            Some(DialogKind::NotRegistered)
        );
        assert_eq!(classify("Update NIK peserta?"), Some(DialogKind::IdentityUpdate));
    }

    #[test]
    fn most_severe_match_wins() {
        assert_eq!(
            classify("Peringatan: status peserta tidak aktif"),
            Some(DialogKind::Inactive)
        );
    }

    #[test]
    fn unknown_text_is_not_classified() {
        assert_eq!(classify("Session expired, please login"), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn only_rejections_block_submission() {
        assert!(DialogKind::NotRegistered.blocks_submission());
        assert!(DialogKind::AlreadyRegistered.blocks_submission());
        assert!(!DialogKind::Warning.blocks_submission());
        assert!(!DialogKind::IdentityUpdate.blocks_submission());
    }
}
