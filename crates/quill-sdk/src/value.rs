//! Dynamic values held by the host.

use std::collections::BTreeMap;
use std::fmt;

use quill_sys::*;

use crate::{SysError, utf8};

/// Variant tag of a host value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Int,
    Float,
    String,
    Bool,
    Array,
    Object,
    Date,
    /// An HTML document, element or node-set.
    Node,
}

impl Kind {
    /// Decodes a kind code reported by the host.
    #[must_use]
    pub fn from_raw(code: i32) -> Option<Self> {
        Some(match code {
            0 => Self::Null,
            1 => Self::Int,
            2 => Self::Float,
            3 => Self::String,
            4 => Self::Bool,
            5 => Self::Array,
            6 => Self::Object,
            7 => Self::Date,
            8 => Self::Node,
            _ => return None,
        })
    }

    fn decode(code: i32) -> Result<Self, SysError> {
        Self::from_raw(code)
            .ok_or_else(|| SysError::ApiError(format!("unknown value kind code {code}")))
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Owned handle to a host value.
///
/// The kind is fixed when the value is created and cached here. Narrowing
/// accessors (`as_int`, `as_string`, ...) panic when called on another kind.
/// Dropping the wrapper releases the handle; the host keeps the value alive
/// while a container still refers to it.
#[derive(Debug)]
pub struct ValueRef {
    handle: Handle,
    kind: Kind,
}

impl ValueRef {
    /// Takes ownership of a handle returned by a boundary call.
    ///
    /// The handle is released if the host reports a kind this crate does
    /// not know.
    pub fn from_handle(handle: Handle) -> Result<Self, SysError> {
        let mut value = Self {
            handle,
            kind: Kind::Null,
        };
        let code = unsafe { quill_value_type_of(handle)? };
        value.kind = Kind::decode(code)?;
        Ok(value)
    }

    fn created(handle: Handle, kind: Kind) -> Self {
        Self { handle, kind }
    }

    pub fn null() -> Result<Self, SysError> {
        let handle = unsafe { quill_value_create_null()? };
        Ok(Self::created(handle, Kind::Null))
    }

    pub fn array() -> Result<Self, SysError> {
        let handle = unsafe { quill_value_create_array()? };
        Ok(Self::created(handle, Kind::Array))
    }

    pub fn object() -> Result<Self, SysError> {
        let handle = unsafe { quill_value_create_object()? };
        Ok(Self::created(handle, Kind::Object))
    }

    pub fn string(value: &str) -> Result<Self, SysError> {
        let handle = unsafe { quill_value_create_string(value.as_bytes().to_vec())? };
        Ok(Self::created(handle, Kind::String))
    }

    pub fn integer(value: i64) -> Result<Self, SysError> {
        let handle = unsafe { quill_value_create_int(value)? };
        Ok(Self::created(handle, Kind::Int))
    }

    pub fn float(value: f64) -> Result<Self, SysError> {
        let handle = unsafe { quill_value_create_float(value)? };
        Ok(Self::created(handle, Kind::Float))
    }

    pub fn boolean(value: bool) -> Result<Self, SysError> {
        let handle = unsafe { quill_value_create_bool(i32::from(value))? };
        Ok(Self::created(handle, Kind::Bool))
    }

    /// A Date from milliseconds since the Unix epoch.
    pub fn date(millis: f64) -> Result<Self, SysError> {
        let handle = unsafe { quill_value_create_date(millis)? };
        Ok(Self::created(handle, Kind::Date))
    }

    #[must_use]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Gives up ownership without releasing the handle.
    #[must_use]
    pub fn into_handle(self) -> Handle {
        let handle = self.handle;
        std::mem::forget(self);
        handle
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.kind == Kind::Null
    }

    #[must_use]
    pub fn is_int(&self) -> bool {
        self.kind == Kind::Int
    }

    #[must_use]
    pub fn is_float(&self) -> bool {
        self.kind == Kind::Float
    }

    #[must_use]
    pub fn is_string(&self) -> bool {
        self.kind == Kind::String
    }

    #[must_use]
    pub fn is_bool(&self) -> bool {
        self.kind == Kind::Bool
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        self.kind == Kind::Array
    }

    #[must_use]
    pub fn is_object(&self) -> bool {
        self.kind == Kind::Object
    }

    #[must_use]
    pub fn is_date(&self) -> bool {
        self.kind == Kind::Date
    }

    #[must_use]
    pub fn is_node(&self) -> bool {
        self.kind == Kind::Node
    }

    fn expect_kind(&self, expected: Kind) {
        assert!(
            self.kind == expected,
            "expected {expected} value, found {}",
            self.kind
        );
    }

    /// # Panics
    ///
    /// Panics unless the value is an Int.
    pub fn as_int(&self) -> Result<i64, SysError> {
        self.expect_kind(Kind::Int);
        Ok(unsafe { quill_value_read_int(self.handle)? })
    }

    /// # Panics
    ///
    /// Panics unless the value is a Float.
    pub fn as_float(&self) -> Result<f64, SysError> {
        self.expect_kind(Kind::Float);
        Ok(unsafe { quill_value_read_float(self.handle)? })
    }

    /// # Panics
    ///
    /// Panics unless the value is a Bool.
    pub fn as_bool(&self) -> Result<bool, SysError> {
        self.expect_kind(Kind::Bool);
        Ok(unsafe { quill_value_read_bool(self.handle)? } != 0)
    }

    /// # Panics
    ///
    /// Panics unless the value is a String.
    pub fn as_string(&self) -> Result<String, SysError> {
        self.expect_kind(Kind::String);
        utf8(unsafe { quill_value_read_string(self.handle)? })
    }

    /// Byte length of a String value, without transferring the text.
    ///
    /// # Panics
    ///
    /// Panics unless the value is a String.
    pub fn string_len(&self) -> Result<usize, SysError> {
        self.expect_kind(Kind::String);
        let len = unsafe { quill_value_read_string_len(self.handle)? };
        Ok(len as usize)
    }

    /// Parses a String value as a date and returns epoch milliseconds.
    ///
    /// `format` uses `strftime` syntax. `time_zone` is `UTC`, `GMT` or a
    /// fixed offset such as `+09:00`; `None` means UTC.
    ///
    /// # Panics
    ///
    /// Panics unless the value is a String.
    pub fn as_date(
        &self,
        format: &str,
        locale: Option<&str>,
        time_zone: Option<&str>,
    ) -> Result<f64, SysError> {
        self.expect_kind(Kind::String);
        let millis = unsafe {
            quill_value_read_date_string(
                self.handle,
                format.as_bytes().to_vec(),
                locale.unwrap_or_default().as_bytes().to_vec(),
                time_zone.unwrap_or_default().as_bytes().to_vec(),
            )?
        };
        Ok(millis)
    }

    /// Epoch milliseconds of a Date value.
    ///
    /// # Panics
    ///
    /// Panics unless the value is a Date.
    pub fn as_timestamp(&self) -> Result<f64, SysError> {
        self.expect_kind(Kind::Date);
        Ok(unsafe { quill_value_read_date(self.handle)? })
    }

    /// Element count of an Array or member count of an Object.
    ///
    /// # Panics
    ///
    /// Panics unless the value is an Array or Object.
    pub fn len(&self) -> Result<usize, SysError> {
        let len = match self.kind {
            Kind::Array => unsafe { quill_array_len(self.handle)? },
            Kind::Object => unsafe { quill_object_len(self.handle)? },
            other => panic!("expected Array or Object value, found {other}"),
        };
        Ok(len as usize)
    }

    /// # Panics
    ///
    /// Panics unless the value is an Array or Object.
    pub fn is_empty(&self) -> Result<bool, SysError> {
        Ok(self.len()? == 0)
    }

    /// Member at `key`; a Null value when there is none.
    ///
    /// # Panics
    ///
    /// Panics unless the value is an Object.
    pub fn get(&self, key: &str) -> Result<ValueRef, SysError> {
        self.expect_kind(Kind::Object);
        let handle = unsafe { quill_object_get(self.handle, key.as_bytes().to_vec())? };
        Self::from_handle(handle)
    }

    /// # Panics
    ///
    /// Panics unless the value is an Object.
    pub fn set(&self, key: &str, value: &ValueRef) -> Result<(), SysError> {
        self.expect_kind(Kind::Object);
        unsafe { quill_object_set(self.handle, key.as_bytes().to_vec(), value.handle)? };
        Ok(())
    }

    /// # Panics
    ///
    /// Panics unless the value is an Object.
    pub fn remove(&self, key: &str) -> Result<(), SysError> {
        self.expect_kind(Kind::Object);
        unsafe { quill_object_remove(self.handle, key.as_bytes().to_vec())? };
        Ok(())
    }

    /// # Panics
    ///
    /// Panics unless the value is an Object.
    pub fn contains_key(&self, key: &str) -> Result<bool, SysError> {
        Ok(self.keys()?.iter().any(|k| k == key))
    }

    /// Member names, in the same order as [`Self::values`].
    ///
    /// # Panics
    ///
    /// Panics unless the value is an Object.
    pub fn keys(&self) -> Result<Vec<String>, SysError> {
        self.expect_kind(Kind::Object);
        let keys = Self::from_handle(unsafe { quill_object_keys(self.handle)? })?;
        keys.as_array()?.iter().map(ValueRef::as_string).collect()
    }

    /// # Panics
    ///
    /// Panics unless the value is an Object.
    pub fn values(&self) -> Result<Vec<ValueRef>, SysError> {
        self.expect_kind(Kind::Object);
        let values = Self::from_handle(unsafe { quill_object_values(self.handle)? })?;
        values.as_array()
    }

    /// Members as name/value pairs.
    ///
    /// # Panics
    ///
    /// Panics unless the value is an Object.
    pub fn entries(&self) -> Result<Vec<(String, ValueRef)>, SysError> {
        let keys = self.keys()?;
        let values = self.values()?;
        if keys.len() != values.len() {
            return Err(SysError::ApiError(format!(
                "host returned {} keys but {} values",
                keys.len(),
                values.len()
            )));
        }
        Ok(keys.into_iter().zip(values).collect())
    }

    /// # Panics
    ///
    /// Panics unless the value is an Object.
    pub fn as_object(&self) -> Result<BTreeMap<String, ValueRef>, SysError> {
        Ok(self.entries()?.into_iter().collect())
    }

    /// # Panics
    ///
    /// Panics unless the value is an Array.
    pub fn get_at(&self, index: usize) -> Result<ValueRef, SysError> {
        self.expect_kind(Kind::Array);
        let handle = unsafe { quill_array_get(self.handle, index_arg(index)?)? };
        Self::from_handle(handle)
    }

    /// # Panics
    ///
    /// Panics unless the value is an Array.
    pub fn set_at(&self, index: usize, value: &ValueRef) -> Result<(), SysError> {
        self.expect_kind(Kind::Array);
        unsafe { quill_array_set(self.handle, index_arg(index)?, value.handle)? };
        Ok(())
    }

    /// # Panics
    ///
    /// Panics unless the value is an Array.
    pub fn remove_at(&self, index: usize) -> Result<(), SysError> {
        self.expect_kind(Kind::Array);
        unsafe { quill_array_remove(self.handle, index_arg(index)?)? };
        Ok(())
    }

    /// # Panics
    ///
    /// Panics unless the value is an Array.
    pub fn push(&self, value: &ValueRef) -> Result<(), SysError> {
        self.expect_kind(Kind::Array);
        unsafe { quill_array_append(self.handle, value.handle)? };
        Ok(())
    }

    /// Every element, fetched now.
    ///
    /// # Panics
    ///
    /// Panics unless the value is an Array.
    pub fn as_array(&self) -> Result<Vec<ValueRef>, SysError> {
        self.expect_kind(Kind::Array);
        (0..self.len()?).map(|i| self.get_at(i)).collect()
    }

    /// Deep copy into an independent value.
    pub fn copy(&self) -> Result<ValueRef, SysError> {
        let handle = unsafe { quill_value_copy(self.handle)? };
        Ok(Self::created(handle, self.kind))
    }

    /// Materializes the whole tree. Dates become their timestamp, nodes their markup.
    pub fn to_json(&self) -> Result<serde_json::Value, SysError> {
        use serde_json::Value as Json;

        Ok(match self.kind {
            Kind::Null => Json::Null,
            Kind::Int => self.as_int()?.into(),
            Kind::Float => float_json(self.as_float()?),
            Kind::Date => float_json(self.as_timestamp()?),
            Kind::String => Json::String(self.as_string()?),
            Kind::Bool => Json::Bool(self.as_bool()?),
            Kind::Array => self
                .as_array()?
                .iter()
                .map(ValueRef::to_json)
                .collect::<Result<_, _>>()?,
            Kind::Object => Json::Object(
                self.entries()?
                    .into_iter()
                    .map(|(k, v)| v.to_json().map(|json| (k, json)))
                    .collect::<Result<_, _>>()?,
            ),
            Kind::Node => Json::String(utf8(unsafe { quill_html_outer_html(self.handle)? })?),
        })
    }

    /// Builds a host tree from JSON. Integers that fit `i64` become Int.
    pub fn from_json(json: &serde_json::Value) -> Result<ValueRef, SysError> {
        use serde_json::Value as Json;

        match json {
            Json::Null => Self::null(),
            Json::Bool(b) => Self::boolean(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Self::integer(i),
                None => Self::float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Self::string(s),
            Json::Array(items) => {
                let array = Self::array()?;
                for item in items {
                    array.push(&Self::from_json(item)?)?;
                }
                Ok(array)
            },
            Json::Object(map) => {
                let object = Self::object()?;
                for (key, item) in map {
                    object.set(key, &Self::from_json(item)?)?;
                }
                Ok(object)
            },
        }
    }

    /// Releases the handle now, reporting host errors that drop would ignore.
    pub fn close(self) -> Result<(), SysError> {
        let handle = self.into_handle();
        unsafe { quill_value_destroy(handle)? };
        Ok(())
    }
}

impl Drop for ValueRef {
    fn drop(&mut self) {
        let _ = unsafe { quill_value_destroy(self.handle) };
    }
}

fn index_arg(index: usize) -> Result<u32, SysError> {
    u32::try_from(index).map_err(|_| SysError::ApiError(format!("index {index} out of range")))
}

fn float_json(value: f64) -> serde_json::Value {
    serde_json::Number::from_f64(value).map_or(serde_json::Value::Null, serde_json::Value::Number)
}
