//! mime 类型常量与家族匹配。
//!
//! 这些字符串直接出现在客户端可见的消息头中，必须逐字匹配。比较时忽略大小写与参数
//! （`text/plain; charset=utf-8` 视为 `text/plain`）。

pub const TEXT_PLAIN: &str = "text/plain";
pub const OCTET_STREAM: &str = "application/octet-stream";
/// 遗留协议之间约定的对象流标记。
pub const JAVA_OBJECT_STREAM: &str = "application/java-object-stream";
/// 仅用于解码的对象流别名，也是 1.0 侧对象消息的 content-type。
pub const JAVA_SERIALIZED_OBJECT: &str = "application/x-java-serialized-object";
pub const AMQP_LIST: &str = "amqp/list";
pub const AMQP_MAP: &str = "amqp/map";
pub const JMS_STREAM_MESSAGE: &str = "jms/stream-message";
pub const JMS_MAP_MESSAGE: &str = "jms/map-message";

const TEXTUAL_APPLICATION_TYPES: [&str; 5] = [
    "application/xml",
    "application/xml-dtd",
    "application/json",
    "application/javascript",
    "application/ecmascript",
];

/// 去掉参数与首尾空白后的 `type/subtype`。
pub fn essence(mime: &str) -> &str {
    mime.split(';').next().unwrap_or_default().trim()
}

/// 忽略大小写与参数比较。
pub fn matches(mime: &str, expected: &str) -> bool {
    essence(mime).eq_ignore_ascii_case(expected)
}

/// 文本家族：`text/*`、xml/json/javascript/ecmascript，以及 `application/*+xml`、`application/*+json`。
pub fn is_textual(mime: &str) -> bool {
    let essence = essence(mime).to_ascii_lowercase();
    if essence.starts_with("text/") {
        return true;
    }
    if TEXTUAL_APPLICATION_TYPES.contains(&essence.as_str()) {
        return true;
    }
    essence
        .strip_prefix("application/")
        .and_then(|subtype| {
            subtype
                .strip_suffix("+xml")
                .or_else(|| subtype.strip_suffix("+json"))
        })
        .is_some_and(|prefix| !prefix.is_empty())
}

/// 两种对象流写法之一。
pub fn is_object_stream(mime: &str) -> bool {
    matches(mime, JAVA_OBJECT_STREAM) || matches(mime, JAVA_SERIALIZED_OBJECT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textual_family_matches() {
        for mime in [
            "text/plain",
            "text/foobar",
            "TEXT/XML",
            "application/xml",
            "application/xml-dtd",
            "application/foo+xml",
            "application/json",
            "application/foo+json; charset=utf-8",
            "application/javascript",
            "application/ecmascript",
        ] {
            assert!(is_textual(mime), "{mime} 应属于文本家族");
        }
        for mime in [
            "application/octet-stream",
            "application/bin",
            "application/+json",
            "foo/bar+xml",
            "",
        ] {
            assert!(!is_textual(mime), "{mime} 不属于文本家族");
        }
    }

    #[test]
    fn parameters_and_case_are_ignored() {
        assert!(matches("Jms/Map-Message ; x=1", JMS_MAP_MESSAGE));
        assert!(is_object_stream("application/x-java-serialized-object"));
        assert_eq!(essence(" text/plain ;charset=utf-8"), "text/plain");
    }
}
