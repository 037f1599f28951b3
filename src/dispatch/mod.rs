//! Dispatch table build and lookup
//!
//! ディスパッチテーブルの構築と照合
//!
//! The collector turns `(methods, pattern, value)` submissions into a
//! serializable table: one static entry per literal variant, one dynamic
//! entry (anchored regex + capture bookkeeping) per parameterized
//! variant. The dispatcher compiles a table and answers
//! FOUND / NOT_FOUND / METHOD_NOT_ALLOWED per request.

use ahash::AHashMap as Map;
use regex::Regex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::RouterError;
use crate::pattern::{self, Token};
use crate::utils::method::Method;

/// キャッシュ互換性を判定するスキーマ版数
pub const TABLE_VERSION: u32 = 1;

/// Literal-path entry of the dispatch table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticEntry {
    pub path: String,
    pub methods: Vec<String>,
    pub value: String,
}

/// 正規表現エントリ内のキャプチャ位置
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamCapture {
    pub name: String,
    pub group: usize,
}

/// Regex-path entry of the dispatch table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicEntry {
    pub regex: String,
    pub params: Vec<ParamCapture>,
    pub methods: Vec<String>,
    pub value: String,
}

/// The compiled, persistable route table.
///
/// Vecベースの構造なので直列化は登録順そのままで決定的
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchTable {
    pub version: u32,
    pub statics: Vec<StaticEntry>,
    pub dynamics: Vec<DynamicEntry>,
}

/// 1回のディスパッチの結果
#[derive(Clone, Debug, PartialEq)]
pub enum DispatchOutcome {
    Found {
        value: String,
        params: Map<String, String>,
    },
    NotFound,
    MethodNotAllowed(Vec<Method>),
}

/// Accumulates route submissions and snapshots them into a table.
pub struct RouteCollector {
    statics: Vec<StaticEntry>,
    dynamics: Vec<DynamicEntry>,
}

impl RouteCollector {
    pub fn new() -> RouteCollector {
        RouteCollector {
            statics: Vec::new(),
            dynamics: Vec::new(),
        }
    }

    /// Register a pattern for a method list; `value` is handed back
    /// verbatim on a successful dispatch.
    pub fn add_route(&mut self, methods: &[Method], pattern: &str, value: &str) -> Result<(), RouterError> {
        let methods: Vec<String> = methods.iter().map(|m| m.to_str().to_string()).collect();
        let variants = pattern::parse(pattern)?;

        for variant in variants {
            let mut seen: SmallVec<[&str; 4]> = SmallVec::new();
            for token in &variant {
                if let Some(name) = token.param_name() {
                    if seen.contains(&name) {
                        return Err(RouterError::InvalidPattern(format!(
                            "Cannot use the same placeholder \"{}\" twice",
                            name
                        )));
                    }
                    seen.push(name);
                }
            }

            if seen.is_empty() {
                let mut path = String::new();
                for token in &variant {
                    if let Token::Literal(text) = token {
                        path.push_str(text);
                    }
                }
                self.statics.push(StaticEntry {
                    path,
                    methods: methods.clone(),
                    value: value.to_string(),
                });
                continue;
            }

            let mut regex = String::from("^");
            let mut params = Vec::new();
            let mut group = 0usize;
            for token in &variant {
                match token {
                    Token::Literal(text) => regex.push_str(&regex::escape(text)),
                    Token::Param { name, constraint } => {
                        group += 1;
                        params.push(ParamCapture {
                            name: name.clone(),
                            group,
                        });
                        regex.push('(');
                        regex.push_str(constraint);
                        regex.push(')');
                        // 制約内の独自キャプチャの分だけ番号をずらす
                        group += count_capture_groups(constraint);
                    }
                }
            }
            regex.push('$');
            self.dynamics.push(DynamicEntry {
                regex,
                params,
                methods: methods.clone(),
                value: value.to_string(),
            });
        }
        Ok(())
    }

    /// 現時点の登録内容のスナップショットを取得する
    pub fn table(&self) -> DispatchTable {
        DispatchTable {
            version: TABLE_VERSION,
            statics: self.statics.clone(),
            dynamics: self.dynamics.clone(),
        }
    }
}

impl Default for RouteCollector {
    fn default() -> RouteCollector {
        RouteCollector::new()
    }
}

/// Count the capture groups a constraint opens itself.
fn count_capture_groups(constraint: &str) -> usize {
    let bytes = constraint.as_bytes();
    let mut count = 0;
    let mut in_class = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'[' if !in_class => in_class = true,
            b']' if in_class => in_class = false,
            b'(' if !in_class => {
                if bytes.get(i + 1) != Some(&b'?') {
                    count += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    count
}

struct StaticTarget {
    methods: SmallVec<[Method; 4]>,
    value: String,
}

struct DynamicTarget {
    regex: Regex,
    params: Vec<(String, usize)>,
    methods: SmallVec<[Method; 4]>,
    value: String,
}

/// Compiled lookup structure over a `DispatchTable`.
pub struct Dispatcher {
    statics: Map<String, SmallVec<[StaticTarget; 2]>>,
    dynamics: Vec<DynamicTarget>,
}

impl Dispatcher {
    /// Compile a table. Fails on an uncompilable regex so that a corrupt
    /// table surfaces as an error instead of a panic.
    pub fn new(table: &DispatchTable) -> Result<Dispatcher, RouterError> {
        let mut statics: Map<String, SmallVec<[StaticTarget; 2]>> = Map::default();
        for entry in &table.statics {
            statics.entry(entry.path.clone()).or_default().push(StaticTarget {
                methods: entry.methods.iter().map(|m| Method::from_str(m)).collect(),
                value: entry.value.clone(),
            });
        }

        let mut dynamics = Vec::with_capacity(table.dynamics.len());
        for entry in &table.dynamics {
            let regex = Regex::new(&entry.regex).map_err(|err| {
                RouterError::InvalidPattern(format!(
                    "route regex `{}` failed to compile: {}",
                    entry.regex, err
                ))
            })?;
            dynamics.push(DynamicTarget {
                regex,
                params: entry.params.iter().map(|p| (p.name.clone(), p.group)).collect(),
                methods: entry.methods.iter().map(|m| Method::from_str(m)).collect(),
                value: entry.value.clone(),
            });
        }

        Ok(Dispatcher { statics, dynamics })
    }

    /// Resolve a decoded path for a method.
    ///
    /// 照合順は登録順。405の許可メソッドは初出順で重複排除
    pub fn dispatch(&self, method: &Method, path: &str) -> DispatchOutcome {
        if let Some(targets) = self.statics.get(path) {
            for target in targets {
                if target.methods.contains(method) {
                    return DispatchOutcome::Found {
                        value: target.value.clone(),
                        params: Map::default(),
                    };
                }
            }
        }

        for target in &self.dynamics {
            if !target.methods.contains(method) {
                continue;
            }
            if let Some(caps) = target.regex.captures(path) {
                let mut params = Map::default();
                for (name, group) in &target.params {
                    if let Some(m) = caps.get(*group) {
                        params.insert(name.clone(), m.as_str().to_string());
                    }
                }
                return DispatchOutcome::Found {
                    value: target.value.clone(),
                    params,
                };
            }
        }

        let mut allowed: Vec<Method> = Vec::new();
        if let Some(targets) = self.statics.get(path) {
            for target in targets {
                for m in &target.methods {
                    if !allowed.contains(m) {
                        allowed.push(m.clone());
                    }
                }
            }
        }
        for target in &self.dynamics {
            if target.regex.is_match(path) {
                for m in &target.methods {
                    if !allowed.contains(m) {
                        allowed.push(m.clone());
                    }
                }
            }
        }

        if allowed.is_empty() {
            DispatchOutcome::NotFound
        } else {
            DispatchOutcome::MethodNotAllowed(allowed)
        }
    }
}
