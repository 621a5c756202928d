use std::collections::HashMap;

use chrono::{Duration, Local, Utc};
use scenic_core::types::AnyValue;
use serde_json::json;

/// Named arguments passed to a registered function, already resolved.
#[derive(Debug, Clone, Default)]
pub struct ToolArgs {
    args: HashMap<String, AnyValue>,
}

impl ToolArgs {
    pub fn new(args: HashMap<String, AnyValue>) -> Self {
        Self { args }
    }

    pub fn get(&self, name: &str) -> Option<&AnyValue> {
        self.args.get(name)
    }

    /// First value present under any of the given names. Functions
    /// accept both the short and the historical `*_val` spellings.
    fn pick(&self, names: &[&str]) -> Option<&AnyValue> {
        names.iter().find_map(|n| self.args.get(*n))
    }

    pub fn i64_named(&self, names: &[&str], default: i64) -> Result<i64, String> {
        match self.pick(names) {
            None => Ok(default),
            Some(v) => v
                .as_i64()
                .ok_or_else(|| format!("argument `{}` must be an integer, got {v}", names[0])),
        }
    }

    pub fn f64_named(&self, names: &[&str], default: f64) -> Result<f64, String> {
        match self.pick(names) {
            None => Ok(default),
            Some(v) => v
                .as_f64()
                .ok_or_else(|| format!("argument `{}` must be a number, got {v}", names[0])),
        }
    }

    pub fn usize_named(&self, names: &[&str], default: usize) -> Result<usize, String> {
        let v = self.i64_named(names, default as i64)?;
        usize::try_from(v).map_err(|_| format!("argument `{}` must be non-negative", names[0]))
    }

    pub fn str_named(&self, names: &[&str], default: &str) -> Result<String, String> {
        match self.pick(names) {
            None => Ok(default.to_string()),
            Some(AnyValue::String(s)) => Ok(s.clone()),
            Some(v) => Err(format!("argument `{}` must be a string, got {v}", names[0])),
        }
    }
}

type ToolFn = dyn Fn(&ToolArgs) -> Result<AnyValue, String> + Send + Sync;

/// Whitelisted named callables invocable from expressions as
/// `{{ module.fn(...) }}`. Nothing outside the registry can be called.
#[derive(Default)]
pub struct FunctionRegistry {
    funcs: HashMap<(String, String), Box<ToolFn>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the `tools` data-factory module.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        register_tools(&mut reg);
        reg
    }

    pub fn register<F>(&mut self, module: &str, name: &str, f: F)
    where
        F: Fn(&ToolArgs) -> Result<AnyValue, String> + Send + Sync + 'static,
    {
        self.funcs
            .insert((module.to_string(), name.to_string()), Box::new(f));
    }

    pub fn get(&self, module: &str, name: &str) -> Option<&ToolFn> {
        self.funcs
            .get(&(module.to_string(), name.to_string()))
            .map(|b| b.as_ref())
    }

    pub fn contains(&self, module: &str, name: &str) -> bool {
        self.funcs
            .contains_key(&(module.to_string(), name.to_string()))
    }
}

fn register_tools(reg: &mut FunctionRegistry) {
    reg.register("tools", "timestamp", |_| Ok(json!(Utc::now().timestamp())));
    reg.register("tools", "timestamp_ms", |_| {
        Ok(json!(Utc::now().timestamp_millis()))
    });
    reg.register("tools", "datetime_now", |args| {
        let fmt = args.str_named(&["fmt"], "%Y-%m-%d %H:%M:%S")?;
        Ok(json!(Local::now().format(&fmt).to_string()))
    });
    reg.register("tools", "date_today", |args| {
        let fmt = args.str_named(&["fmt"], "%Y-%m-%d")?;
        Ok(json!(Local::now().format(&fmt).to_string()))
    });
    reg.register("tools", "date_offset", |args| {
        let days = args.i64_named(&["days"], 0)?;
        let fmt = args.str_named(&["fmt"], "%Y-%m-%d")?;
        let when = Local::now() + Duration::days(days);
        Ok(json!(when.format(&fmt).to_string()))
    });
    reg.register("tools", "uuid", |_| {
        Ok(json!(uuid::Uuid::new_v4().to_string()))
    });
    reg.register("tools", "uuid_short", |_| {
        Ok(json!(uuid::Uuid::new_v4().to_string()[..8].to_string()))
    });
    reg.register("tools", "random_int", |args| {
        let min = args.i64_named(&["min", "min_val"], 1)?;
        let max = args.i64_named(&["max", "max_val"], 10_000)?;
        if min > max {
            return Err(format!("min {min} greater than max {max}"));
        }
        Ok(json!(fastrand::i64(min..=max)))
    });
    reg.register("tools", "random_float", |args| {
        let min = args.f64_named(&["min", "min_val"], 0.0)?;
        let max = args.f64_named(&["max", "max_val"], 100.0)?;
        let precision = args.i64_named(&["precision"], 2)?.clamp(0, 12) as i32;
        if min > max {
            return Err(format!("min {min} greater than max {max}"));
        }
        let v = min + fastrand::f64() * (max - min);
        let scale = 10f64.powi(precision);
        let rounded = (v * scale).round() / scale;
        serde_json::Number::from_f64(rounded)
            .map(AnyValue::Number)
            .ok_or_else(|| "result is not a finite number".to_string())
    });
    reg.register("tools", "random_str", |args| {
        let length = args.usize_named(&["length"], 8)?;
        Ok(json!((0..length)
            .map(|_| fastrand::alphanumeric())
            .collect::<String>()))
    });
    reg.register("tools", "random_letters", |args| {
        let length = args.usize_named(&["length"], 8)?;
        Ok(json!((0..length)
            .map(|_| fastrand::alphabetic())
            .collect::<String>()))
    });
    reg.register("tools", "random_digits", |args| {
        let length = args.usize_named(&["length"], 6)?;
        Ok(json!((0..length)
            .map(|_| fastrand::digit(10))
            .collect::<String>()))
    });
    reg.register("tools", "random_choice", |args| match args.get("items") {
        Some(AnyValue::Array(items)) if !items.is_empty() => {
            Ok(items[fastrand::usize(..items.len())].clone())
        }
        Some(AnyValue::Array(_)) | None => Ok(AnyValue::Null),
        Some(v) => Err(format!("argument `items` must be an array, got {v}")),
    });
    reg.register("tools", "fake_email", |args| {
        let prefix = args.str_named(&["prefix"], "test")?;
        Ok(json!(format!(
            "{prefix}_{}@test.com",
            Utc::now().timestamp()
        )))
    });
    reg.register("tools", "fake_phone", |_| {
        const PREFIXES: [&str; 10] = [
            "138", "139", "150", "151", "152", "158", "159", "186", "187", "188",
        ];
        let prefix = PREFIXES[fastrand::usize(..PREFIXES.len())];
        let rest: String = (0..8).map(|_| fastrand::digit(10)).collect();
        Ok(json!(format!("{prefix}{rest}")))
    });
    reg.register("tools", "fake_username", |args| {
        let prefix = args.str_named(&["prefix"], "user")?;
        let short = &uuid::Uuid::new_v4().to_string()[..8];
        Ok(json!(format!("{prefix}_{short}")))
    });
    reg.register("tools", "fake_name", |_| {
        const SURNAMES: [&str; 10] = ["张", "李", "王", "刘", "陈", "杨", "赵", "黄", "周", "吴"];
        const GIVEN: [&str; 15] = [
            "伟", "芳", "娜", "敏", "静", "强", "磊", "洋", "勇", "艳", "杰", "娟", "涛", "明",
            "超",
        ];
        let mut name = SURNAMES[fastrand::usize(..SURNAMES.len())].to_string();
        for _ in 0..fastrand::usize(1..=2) {
            name.push_str(GIVEN[fastrand::usize(..GIVEN.len())]);
        }
        Ok(json!(name))
    });
    reg.register("tools", "fake_address", |_| {
        const CITIES: [&str; 8] = [
            "北京市", "上海市", "广州市", "深圳市", "杭州市", "成都市", "武汉市", "南京市",
        ];
        const DISTRICTS: [&str; 8] = [
            "朝阳区", "海淀区", "浦东新区", "天河区", "南山区", "西湖区", "武侯区", "江宁区",
        ];
        const STREETS: [&str; 6] = ["科技路", "创新大道", "人民路", "中山路", "解放路", "建设路"];
        Ok(json!(format!(
            "{}{}{}{}号",
            CITIES[fastrand::usize(..CITIES.len())],
            DISTRICTS[fastrand::usize(..DISTRICTS.len())],
            STREETS[fastrand::usize(..STREETS.len())],
            fastrand::i64(1..=999)
        )))
    });
    reg.register("tools", "fake_id_card", |_| {
        // Synthetic 18-character id, never a real one.
        const CHECKS: [char; 11] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'X'];
        let area: String = (0..6).map(|_| fastrand::digit(10)).collect();
        let year = fastrand::i64(1970..=2000);
        let month = fastrand::i64(1..=12);
        let day = fastrand::i64(1..=28);
        let seq: String = (0..3).map(|_| fastrand::digit(10)).collect();
        let check = CHECKS[fastrand::usize(..CHECKS.len())];
        Ok(json!(format!("{area}{year}{month:02}{day:02}{seq}{check}")))
    });
    reg.register("tools", "fake_company", |_| {
        const HEADS: [&str; 10] = ["华", "中", "东", "西", "南", "北", "新", "金", "银", "瑞"];
        const MIDS: [&str; 10] = ["科", "创", "智", "信", "达", "联", "通", "盛", "鑫", "源"];
        const TAILS: [&str; 4] = [
            "科技有限公司",
            "网络有限公司",
            "信息技术有限公司",
            "电子商务有限公司",
        ];
        Ok(json!(format!(
            "{}{}{}",
            HEADS[fastrand::usize(..HEADS.len())],
            MIDS[fastrand::usize(..MIDS.len())],
            TAILS[fastrand::usize(..TAILS.len())]
        )))
    });
}
