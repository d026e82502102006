//! VersionOrdering - 不透明なバージョンラベルの並び順
//!
//! バージョンラベルの意味は解釈しません。レジストリは新しい順に返すだけなので、
//! 比較関数が 1 つあれば足ります。2 種類を用意しています：
//!
//! - [`VersionOrdering::Natural`]: ASCII 数字の連続は数値として比較し、
//!   それ以外はバイト列で比較する。`"10" > "9"`, `"1.10" > "1.9"`
//! - [`VersionOrdering::Lexical`]: 単純なバイト列比較。DB の `BINARY`
//!   照合順序と同じ結果になる。`"9" > "10"`

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::artifact::DeliveryArtifactVersion;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionOrdering {
    #[default]
    Natural,
    Lexical,
}

impl VersionOrdering {
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            Self::Natural => natural_cmp(a, b),
            Self::Lexical => a.cmp(b),
        }
    }

    /// 新しい（大きい）順に並べる
    pub fn sort_descending(&self, versions: &mut [DeliveryArtifactVersion]) {
        versions.sort_by(|a, b| self.compare(&b.version, &a.version));
    }
}

/// 全順序。チャンク比較で同順位ならバイト列比較に落とすので、
/// `Equal` になるのは完全に同じ文字列だけ
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Chunks::new(a);
    let mut right = Chunks::new(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = compare_chunks(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn compare_chunks(x: &str, y: &str) -> Ordering {
    match (is_digits(x), is_digits(y)) {
        (true, true) => {
            let xs = x.trim_start_matches('0');
            let ys = y.trim_start_matches('0');
            xs.len()
                .cmp(&ys.len())
                .then_with(|| xs.cmp(ys))
                // "01" と "1" は先頭ゼロが少ない方が先
                .then_with(|| x.len().cmp(&y.len()))
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => x.cmp(y),
    }
}

fn is_digits(chunk: &str) -> bool {
    chunk.as_bytes().first().is_some_and(u8::is_ascii_digit)
}

/// ラベルを数字 / 非数字の連続に分割するイテレータ
struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let first = *self.rest.as_bytes().first()?;
        let digit = first.is_ascii_digit();
        let end = self
            .rest
            .bytes()
            .position(|b| b.is_ascii_digit() != digit)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(chunk)
    }
}
