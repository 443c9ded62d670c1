//! Logging, defaults and deep-link calls.

use std::collections::BTreeMap;

use super::{Session, optional_utf8, utf8};
use crate::error::HostResult;
use crate::logging;
use crate::value::{Kind, Value, deep_copy};

impl Session {
    /// Re-emits a guest message under the guest log target.
    ///
    /// # Errors
    ///
    /// Fails if the level is not UTF-8. Invalid UTF-8 in the message is replaced.
    pub fn log(&self, level: &[u8], message: &[u8]) -> HostResult<()> {
        let level = utf8(level, "log level")?;
        logging::guest_log(level, &String::from_utf8_lossy(message));
        Ok(())
    }

    /// Copy of the stored value, or Null when the key is unset.
    ///
    /// # Errors
    ///
    /// Fails if the key is not UTF-8.
    pub fn defaults_get(&mut self, key: &[u8]) -> HostResult<u32> {
        let key = utf8(key, "defaults key")?;
        let stored = self
            .defaults
            .get(key)
            .map_or_else(|| Value::Null.into_slot(), deep_copy);
        Ok(self.alloc_slot(stored))
    }

    /// Stores a deep copy of the value. Storing Null unsets the key.
    ///
    /// # Errors
    ///
    /// Fails for non-UTF-8 keys and unknown handles.
    pub fn defaults_set(&mut self, key: &[u8], value: u32) -> HostResult<()> {
        let key = utf8(key, "defaults key")?.to_owned();
        let slot = self.slot(value)?;
        if slot.borrow().kind() == Kind::Null {
            tracing::debug!(key = key.as_str(), "cleared default");
            self.defaults.remove(&key);
        } else {
            tracing::debug!(key = key.as_str(), "stored default");
            self.defaults.insert(key, deep_copy(&slot));
        }
        Ok(())
    }

    /// Object value `{ "manga": id, "chapter": id or null }`. An empty chapter means none.
    ///
    /// # Errors
    ///
    /// Fails if an id is not UTF-8.
    pub fn deeplink_create(&mut self, manga_id: &[u8], chapter_id: &[u8]) -> HostResult<u32> {
        let manga = utf8(manga_id, "manga id")?.to_owned();
        let chapter = optional_utf8(chapter_id, "chapter id")?
            .map_or(Value::Null, |id| Value::String(id.to_owned()));
        let link = BTreeMap::from([
            ("manga".to_owned(), Value::String(manga).into_slot()),
            ("chapter".to_owned(), chapter.into_slot()),
        ]);
        Ok(self.alloc(Value::Object(link)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_accepts_any_message_bytes() {
        let s = Session::default();
        s.log(b"info", b"hello").unwrap();
        s.log(b"warn", &[0xff, 0xfe]).unwrap();
        assert!(s.log(&[0xff], b"x").is_err());
    }

    #[test]
    fn unset_defaults_are_null() {
        let mut s = Session::default();
        let handle = s.defaults_get(b"missing").unwrap();
        assert_eq!(s.value_type_of(handle).unwrap(), Kind::Null as i32);
    }

    #[test]
    fn defaults_store_copies() {
        let mut s = Session::default();
        let list = s.json_parse(b"[1, 2]").unwrap();
        s.defaults_set(b"list", list).unwrap();
        let three = s.value_create_int(3);
        s.array_append(list, three).unwrap();

        let stored = s.defaults_get(b"list").unwrap();
        assert_eq!(s.array_len(stored).unwrap(), 2);
        s.array_append(stored, three).unwrap();
        let again = s.defaults_get(b"list").unwrap();
        assert_eq!(s.array_len(again).unwrap(), 2);
    }

    #[test]
    fn storing_null_clears() {
        let mut s = Session::default();
        let value = s.value_create_bool(1);
        s.defaults_set(b"flag", value).unwrap();
        let null = s.value_create_null();
        s.defaults_set(b"flag", null).unwrap();
        let read = s.defaults_get(b"flag").unwrap();
        assert_eq!(s.value_type_of(read).unwrap(), Kind::Null as i32);
    }

    #[test]
    fn deeplinks_are_objects() {
        let mut s = Session::default();
        let link = s.deeplink_create(b"m1", b"c9").unwrap();
        let manga = s.object_get(link, b"manga").unwrap();
        let chapter = s.object_get(link, b"chapter").unwrap();
        assert_eq!(s.value_read_string(manga).unwrap(), b"m1");
        assert_eq!(s.value_read_string(chapter).unwrap(), b"c9");

        let series = s.deeplink_create(b"m1", b"").unwrap();
        let chapter = s.object_get(series, b"chapter").unwrap();
        assert_eq!(s.value_type_of(chapter).unwrap(), Kind::Null as i32);
        assert_eq!(s.object_len(series).unwrap(), 2);
    }
}
