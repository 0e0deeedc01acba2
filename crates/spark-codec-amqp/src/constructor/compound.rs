use spark_buffer::ViewChain;

use crate::{
    error::CodecError,
    handler::ValueHandler,
    types::{AmqpMap, Value},
};

use super::{SizeWidth, TypeConstructor};

/// 读取复合编码的 `size`/`count` 头部，并校验其与剩余数据一致。
fn read_header(
    name: &str,
    width: SizeWidth,
    input: &mut ViewChain,
) -> Result<(usize, usize), CodecError> {
    if !input.has_remaining(2 * width.bytes()) {
        return Err(CodecError::decode(format!(
            "cannot construct {name}: insufficient input data"
        )));
    }
    let size = width.read(input)?;
    if !input.has_remaining(size) {
        return Err(CodecError::decode(format!(
            "cannot construct {name}: size {size} exceeds remaining {} bytes",
            input.remaining()
        )));
    }
    if size < width.bytes() {
        return Err(CodecError::decode(format!(
            "cannot construct {name}: size {size} smaller than count field"
        )));
    }
    let count = width.read(input)?;
    Ok((size - width.bytes(), count))
}

fn check_consumed(name: &str, declared: usize, consumed: usize) -> Result<(), CodecError> {
    if declared != consumed {
        return Err(CodecError::decode(format!(
            "{name} declared {declared} content bytes but encoded {consumed}"
        )));
    }
    Ok(())
}

/// `list8`/`list32` 构造器。
#[derive(Debug, Clone, Copy)]
pub struct ListConstructor {
    width: SizeWidth,
}

impl ListConstructor {
    pub const fn new(width: SizeWidth) -> Self {
        Self { width }
    }
}

impl TypeConstructor for ListConstructor {
    fn name(&self) -> &'static str {
        "list"
    }

    fn construct(
        &self,
        input: &mut ViewChain,
        handler: &ValueHandler<'_>,
    ) -> Result<Value, CodecError> {
        let (content, count) = read_header(self.name(), self.width, input)?;
        if count > content {
            return Err(CodecError::decode(format!(
                "list count {count} cannot fit in {content} bytes"
            )));
        }
        let mark = input.mark();
        let items = handler.nested(|| {
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(handler.read_value(input)?);
            }
            Ok(items)
        })?;
        check_consumed(self.name(), content, input.consumed_since(&mark))?;
        Ok(Value::List(items))
    }
}

/// `map8`/`map32` 构造器；元素数必须为偶数。
#[derive(Debug, Clone, Copy)]
pub struct MapConstructor {
    width: SizeWidth,
}

impl MapConstructor {
    pub const fn new(width: SizeWidth) -> Self {
        Self { width }
    }
}

impl TypeConstructor for MapConstructor {
    fn name(&self) -> &'static str {
        "map"
    }

    fn construct(
        &self,
        input: &mut ViewChain,
        handler: &ValueHandler<'_>,
    ) -> Result<Value, CodecError> {
        let (content, count) = read_header(self.name(), self.width, input)?;
        if count % 2 != 0 {
            return Err(CodecError::decode(format!(
                "map element count {count} is odd"
            )));
        }
        if count > content {
            return Err(CodecError::decode(format!(
                "map count {count} cannot fit in {content} bytes"
            )));
        }
        let mark = input.mark();
        let map = handler.nested(|| {
            let mut map = AmqpMap::with_capacity(count / 2);
            for _ in 0..count / 2 {
                let key = handler.read_value(input)?;
                let value = handler.read_value(input)?;
                if map.insert(key, value).is_some() {
                    return Err(CodecError::decode("map contains duplicate key"));
                }
            }
            Ok(map)
        })?;
        check_consumed(self.name(), content, input.consumed_since(&mark))?;
        Ok(Value::Map(map))
    }
}

/// `array8`/`array32` 构造器：单一元素构造器，元素不再携带格式码。
///
/// 元素数不得超过内容字节数。零宽元素（`null`、`true`、`uint0` 等）本身不消耗字节，
/// 若不设此上限，几个字节的头部即可声明任意多个元素。
#[derive(Debug, Clone, Copy)]
pub struct ArrayConstructor {
    width: SizeWidth,
}

impl ArrayConstructor {
    pub const fn new(width: SizeWidth) -> Self {
        Self { width }
    }
}

impl TypeConstructor for ArrayConstructor {
    fn name(&self) -> &'static str {
        "array"
    }

    fn construct(
        &self,
        input: &mut ViewChain,
        handler: &ValueHandler<'_>,
    ) -> Result<Value, CodecError> {
        let (content, count) = read_header(self.name(), self.width, input)?;
        if count > content {
            return Err(CodecError::decode(format!(
                "array count {count} cannot fit in {content} bytes"
            )));
        }
        let mark = input.mark();
        let items = handler.nested(|| {
            let element = handler.read_array_element(input)?;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(element.construct(input, handler)?);
            }
            Ok(items)
        })?;
        check_consumed(self.name(), content, input.consumed_since(&mark))?;
        Ok(Value::Array(items))
    }
}
