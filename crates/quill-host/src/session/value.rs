//! Value, array, object and JSON calls.

use std::collections::BTreeMap;

use super::{Resource, Session, expect_kind, optional_utf8, utf8};
use crate::error::{HostError, HostResult};
use crate::value::{Kind, Slot, Value, deep_copy, parse_date, reaches};

impl Session {
    pub fn value_create_null(&mut self) -> u32 {
        self.alloc(Value::Null)
    }

    pub fn value_create_array(&mut self) -> u32 {
        self.alloc(Value::Array(Vec::new()))
    }

    pub fn value_create_object(&mut self) -> u32 {
        self.alloc(Value::Object(BTreeMap::new()))
    }

    /// # Errors
    ///
    /// Fails if `bytes` is not UTF-8.
    pub fn value_create_string(&mut self, bytes: &[u8]) -> HostResult<u32> {
        let text = utf8(bytes, "string value")?.to_owned();
        Ok(self.alloc(Value::String(text)))
    }

    pub fn value_create_bool(&mut self, value: i32) -> u32 {
        self.alloc(Value::Bool(value != 0))
    }

    pub fn value_create_int(&mut self, value: i64) -> u32 {
        self.alloc(Value::Int(value))
    }

    pub fn value_create_float(&mut self, value: f64) -> u32 {
        self.alloc(Value::Float(value))
    }

    pub fn value_create_date(&mut self, millis: f64) -> u32 {
        self.alloc(Value::Date(millis))
    }

    /// Kind code of the resource. Requests report Null.
    ///
    /// # Errors
    ///
    /// Fails for unknown handles.
    pub fn value_type_of(&self, handle: u32) -> HostResult<i32> {
        let kind = match self.resources.get(handle)? {
            Resource::Value(slot) => slot.borrow().kind(),
            Resource::Request(_) => Kind::Null,
        };
        Ok(kind as i32)
    }

    /// # Errors
    ///
    /// Fails for unknown handles and non-Bool values.
    pub fn value_read_bool(&self, handle: u32) -> HostResult<i32> {
        self.read(handle, Kind::Bool, |v| match v {
            Value::Bool(b) => Some(i32::from(*b)),
            _ => None,
        })
    }

    /// # Errors
    ///
    /// Fails for unknown handles and non-Int values.
    pub fn value_read_int(&self, handle: u32) -> HostResult<i64> {
        self.read(handle, Kind::Int, |v| match v {
            Value::Int(i) => Some(*i),
            _ => None,
        })
    }

    /// # Errors
    ///
    /// Fails for unknown handles and non-Float values.
    pub fn value_read_float(&self, handle: u32) -> HostResult<f64> {
        self.read(handle, Kind::Float, |v| match v {
            Value::Float(f) => Some(*f),
            _ => None,
        })
    }

    /// # Errors
    ///
    /// Fails for unknown handles and non-String values.
    pub fn value_read_string(&self, handle: u32) -> HostResult<Vec<u8>> {
        self.read(handle, Kind::String, |v| match v {
            Value::String(s) => Some(s.as_bytes().to_vec()),
            _ => None,
        })
    }

    /// Byte length of a String value.
    ///
    /// # Errors
    ///
    /// Fails for unknown handles and non-String values.
    pub fn value_read_string_len(&self, handle: u32) -> HostResult<u32> {
        self.read(handle, Kind::String, |v| match v {
            Value::String(s) => Some(u32::try_from(s.len()).unwrap_or(u32::MAX)),
            _ => None,
        })
    }

    /// # Errors
    ///
    /// Fails for unknown handles and non-Date values.
    pub fn value_read_date(&self, handle: u32) -> HostResult<f64> {
        self.read(handle, Kind::Date, |v| match v {
            Value::Date(ms) => Some(*ms),
            _ => None,
        })
    }

    /// Parses a String value as a date. Empty `locale`/`time_zone` mean absent.
    ///
    /// # Errors
    ///
    /// Fails for non-String values and text that does not match `format`.
    pub fn value_read_date_string(
        &self,
        handle: u32,
        format: &[u8],
        locale: &[u8],
        time_zone: &[u8],
    ) -> HostResult<f64> {
        let text = self.read(handle, Kind::String, |v| match v {
            Value::String(s) => Some(s.clone()),
            _ => None,
        })?;
        parse_date(
            &text,
            utf8(format, "date format")?,
            optional_utf8(locale, "locale")?,
            optional_utf8(time_zone, "time zone")?,
        )
    }

    /// Deep copy into a new handle.
    ///
    /// # Errors
    ///
    /// Fails for unknown handles and requests.
    pub fn value_copy(&mut self, handle: u32) -> HostResult<u32> {
        let copy = deep_copy(&self.slot(handle)?);
        Ok(self.alloc_slot(copy))
    }

    /// Releases a value or HTML handle.
    ///
    /// # Errors
    ///
    /// Fails for unknown handles.
    pub fn value_destroy(&mut self, handle: u32) -> HostResult<()> {
        self.release(handle)
    }

    /// # Errors
    ///
    /// Fails for unknown handles and non-Array values.
    pub fn array_len(&self, handle: u32) -> HostResult<u32> {
        self.with_array(handle, |items| Ok(u32::try_from(items.len()).unwrap_or(u32::MAX)))
    }

    /// New handle to the element at `index`.
    ///
    /// # Errors
    ///
    /// Fails for non-Array values and out-of-range indices.
    pub fn array_get(&mut self, handle: u32, index: u32) -> HostResult<u32> {
        let child = self.with_array(handle, |items| {
            items
                .get(index as usize)
                .cloned()
                .ok_or_else(|| out_of_range(index, items.len()))
        })?;
        Ok(self.alloc_slot(child))
    }

    /// # Errors
    ///
    /// Fails for non-Array values, out-of-range indices and cycles.
    pub fn array_set(&mut self, handle: u32, index: u32, value: u32) -> HostResult<()> {
        let item = self.insertable(handle, value)?;
        self.with_array(handle, |items| {
            let len = items.len();
            let entry = items
                .get_mut(index as usize)
                .ok_or_else(|| out_of_range(index, len))?;
            *entry = item;
            Ok(())
        })
    }

    /// # Errors
    ///
    /// Fails for non-Array values and cycles.
    pub fn array_append(&mut self, handle: u32, value: u32) -> HostResult<()> {
        let item = self.insertable(handle, value)?;
        self.with_array(handle, |items| {
            items.push(item);
            Ok(())
        })
    }

    /// # Errors
    ///
    /// Fails for non-Array values and out-of-range indices.
    pub fn array_remove(&mut self, handle: u32, index: u32) -> HostResult<()> {
        self.with_array(handle, |items| {
            if index as usize >= items.len() {
                return Err(out_of_range(index, items.len()));
            }
            items.remove(index as usize);
            Ok(())
        })
    }

    /// # Errors
    ///
    /// Fails for unknown handles and non-Object values.
    pub fn object_len(&self, handle: u32) -> HostResult<u32> {
        self.with_object(handle, |map| Ok(u32::try_from(map.len()).unwrap_or(u32::MAX)))
    }

    /// New handle to the member at `key`, or to a fresh Null if there is none.
    ///
    /// # Errors
    ///
    /// Fails for non-Object values.
    pub fn object_get(&mut self, handle: u32, key: &[u8]) -> HostResult<u32> {
        let key = utf8(key, "object key")?;
        let child = self.with_object(handle, |map| Ok(map.get(key).cloned()))?;
        Ok(self.alloc_slot(child.unwrap_or_else(|| Value::Null.into_slot())))
    }

    /// # Errors
    ///
    /// Fails for non-Object values and cycles.
    pub fn object_set(&mut self, handle: u32, key: &[u8], value: u32) -> HostResult<()> {
        let key = utf8(key, "object key")?.to_owned();
        let item = self.insertable(handle, value)?;
        self.with_object(handle, |map| {
            map.insert(key, item);
            Ok(())
        })
    }

    /// Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Fails for non-Object values.
    pub fn object_remove(&mut self, handle: u32, key: &[u8]) -> HostResult<()> {
        let key = utf8(key, "object key")?;
        self.with_object(handle, |map| {
            map.remove(key);
            Ok(())
        })
    }

    /// Array of the member names, in ascending order.
    ///
    /// # Errors
    ///
    /// Fails for non-Object values.
    pub fn object_keys(&mut self, handle: u32) -> HostResult<u32> {
        let keys = self.with_object(handle, |map| {
            Ok(map
                .keys()
                .map(|k| Value::String(k.clone()).into_slot())
                .collect())
        })?;
        Ok(self.alloc(Value::Array(keys)))
    }

    /// Array of the members, in the same order as [`Self::object_keys`].
    ///
    /// # Errors
    ///
    /// Fails for non-Object values.
    pub fn object_values(&mut self, handle: u32) -> HostResult<u32> {
        let values = self.with_object(handle, |map| Ok(map.values().cloned().collect()))?;
        Ok(self.alloc(Value::Array(values)))
    }

    /// Parses JSON into a value tree. Invalid input gives a Null value.
    ///
    /// # Errors
    ///
    /// Never fails today; kept fallible like every other boundary call.
    pub fn json_parse(&mut self, bytes: &[u8]) -> HostResult<u32> {
        let value = match serde_json::from_slice::<serde_json::Value>(bytes) {
            Ok(json) => {
                tracing::debug!(len = bytes.len(), "parsed json");
                Value::from_json(&json)
            },
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse json, returning null");
                Value::Null
            },
        };
        Ok(self.alloc(value))
    }

    fn read<T>(
        &self,
        handle: u32,
        expected: Kind,
        read: impl FnOnce(&Value) -> Option<T>,
    ) -> HostResult<T> {
        let slot = self.slot(handle)?;
        let value = slot.borrow();
        read(&value).ok_or_else(|| HostError::WrongKind {
            expected,
            found: value.kind(),
        })
    }

    fn with_array<T>(
        &self,
        handle: u32,
        f: impl FnOnce(&mut Vec<Slot>) -> HostResult<T>,
    ) -> HostResult<T> {
        let slot = self.slot(handle)?;
        expect_kind(&slot, Kind::Array)?;
        let mut value = slot.borrow_mut();
        match &mut *value {
            Value::Array(items) => f(items),
            other => Err(HostError::WrongKind {
                expected: Kind::Array,
                found: other.kind(),
            }),
        }
    }

    fn with_object<T>(
        &self,
        handle: u32,
        f: impl FnOnce(&mut BTreeMap<String, Slot>) -> HostResult<T>,
    ) -> HostResult<T> {
        let slot = self.slot(handle)?;
        expect_kind(&slot, Kind::Object)?;
        let mut value = slot.borrow_mut();
        match &mut *value {
            Value::Object(map) => f(map),
            other => Err(HostError::WrongKind {
                expected: Kind::Object,
                found: other.kind(),
            }),
        }
    }

    /// The slot behind `value`, if storing it in `container` keeps the tree acyclic.
    fn insertable(&self, container: u32, value: u32) -> HostResult<Slot> {
        let container = self.slot(container)?;
        let item = self.slot(value)?;
        if reaches(&item, &container) {
            return Err(HostError::Cycle);
        }
        Ok(item)
    }
}

fn out_of_range(index: u32, len: usize) -> HostError {
    HostError::IndexOutOfRange {
        index: i64::from(index),
        len,
    }
}
