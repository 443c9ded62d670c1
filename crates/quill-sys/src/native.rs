//! Native backend: every boundary call is served by the calling thread's
//! `quill-host` session. Signatures match the Extism imports exactly, so the
//! functions stay `unsafe` even though nothing here is.

#![allow(clippy::missing_safety_doc)]
#![allow(clippy::needless_pass_by_value)]

use extism_pdk::Error;
use quill_host::{HostResult, Session, with_session};

use super::Handle;

fn call<T>(f: impl FnOnce(&mut Session) -> HostResult<T>) -> Result<T, Error> {
    with_session(f).map_err(Error::from)
}

pub unsafe fn quill_value_create_null() -> Result<Handle, Error> {
    call(|s| Ok(s.value_create_null()))
}

pub unsafe fn quill_value_create_array() -> Result<Handle, Error> {
    call(|s| Ok(s.value_create_array()))
}

pub unsafe fn quill_value_create_object() -> Result<Handle, Error> {
    call(|s| Ok(s.value_create_object()))
}

pub unsafe fn quill_value_create_string(value: Vec<u8>) -> Result<Handle, Error> {
    call(|s| s.value_create_string(&value))
}

pub unsafe fn quill_value_create_bool(value: i32) -> Result<Handle, Error> {
    call(|s| Ok(s.value_create_bool(value)))
}

pub unsafe fn quill_value_create_int(value: i64) -> Result<Handle, Error> {
    call(|s| Ok(s.value_create_int(value)))
}

pub unsafe fn quill_value_create_float(value: f64) -> Result<Handle, Error> {
    call(|s| Ok(s.value_create_float(value)))
}

pub unsafe fn quill_value_create_date(millis: f64) -> Result<Handle, Error> {
    call(|s| Ok(s.value_create_date(millis)))
}

pub unsafe fn quill_value_type_of(handle: Handle) -> Result<i32, Error> {
    call(|s| s.value_type_of(handle))
}

pub unsafe fn quill_value_read_bool(handle: Handle) -> Result<i32, Error> {
    call(|s| s.value_read_bool(handle))
}

pub unsafe fn quill_value_read_int(handle: Handle) -> Result<i64, Error> {
    call(|s| s.value_read_int(handle))
}

pub unsafe fn quill_value_read_float(handle: Handle) -> Result<f64, Error> {
    call(|s| s.value_read_float(handle))
}

pub unsafe fn quill_value_read_string(handle: Handle) -> Result<Vec<u8>, Error> {
    call(|s| s.value_read_string(handle))
}

pub unsafe fn quill_value_read_string_len(handle: Handle) -> Result<u32, Error> {
    call(|s| s.value_read_string_len(handle))
}

pub unsafe fn quill_value_read_date(handle: Handle) -> Result<f64, Error> {
    call(|s| s.value_read_date(handle))
}

pub unsafe fn quill_value_read_date_string(
    handle: Handle,
    format: Vec<u8>,
    locale: Vec<u8>,
    time_zone: Vec<u8>,
) -> Result<f64, Error> {
    call(|s| s.value_read_date_string(handle, &format, &locale, &time_zone))
}

pub unsafe fn quill_value_copy(handle: Handle) -> Result<Handle, Error> {
    call(|s| s.value_copy(handle))
}

pub unsafe fn quill_value_destroy(handle: Handle) -> Result<(), Error> {
    call(|s| s.value_destroy(handle))
}

pub unsafe fn quill_array_len(handle: Handle) -> Result<u32, Error> {
    call(|s| s.array_len(handle))
}

pub unsafe fn quill_array_get(handle: Handle, index: u32) -> Result<Handle, Error> {
    call(|s| s.array_get(handle, index))
}

pub unsafe fn quill_array_set(handle: Handle, index: u32, value: Handle) -> Result<(), Error> {
    call(|s| s.array_set(handle, index, value))
}

pub unsafe fn quill_array_append(handle: Handle, value: Handle) -> Result<(), Error> {
    call(|s| s.array_append(handle, value))
}

pub unsafe fn quill_array_remove(handle: Handle, index: u32) -> Result<(), Error> {
    call(|s| s.array_remove(handle, index))
}

pub unsafe fn quill_object_len(handle: Handle) -> Result<u32, Error> {
    call(|s| s.object_len(handle))
}

pub unsafe fn quill_object_get(handle: Handle, key: Vec<u8>) -> Result<Handle, Error> {
    call(|s| s.object_get(handle, &key))
}

pub unsafe fn quill_object_set(handle: Handle, key: Vec<u8>, value: Handle) -> Result<(), Error> {
    call(|s| s.object_set(handle, &key, value))
}

pub unsafe fn quill_object_remove(handle: Handle, key: Vec<u8>) -> Result<(), Error> {
    call(|s| s.object_remove(handle, &key))
}

pub unsafe fn quill_object_keys(handle: Handle) -> Result<Handle, Error> {
    call(|s| s.object_keys(handle))
}

pub unsafe fn quill_object_values(handle: Handle) -> Result<Handle, Error> {
    call(|s| s.object_values(handle))
}

pub unsafe fn quill_json_parse(data: Vec<u8>) -> Result<Handle, Error> {
    call(|s| s.json_parse(&data))
}

pub unsafe fn quill_html_parse(data: Vec<u8>) -> Result<Handle, Error> {
    call(|s| s.html_parse(&data))
}

pub unsafe fn quill_html_parse_with_uri(data: Vec<u8>, base_uri: Vec<u8>) -> Result<Handle, Error> {
    call(|s| s.html_parse_with_uri(&data, &base_uri))
}

pub unsafe fn quill_html_parse_fragment(data: Vec<u8>) -> Result<Handle, Error> {
    call(|s| s.html_parse_fragment(&data))
}

pub unsafe fn quill_html_parse_fragment_with_uri(
    data: Vec<u8>,
    base_uri: Vec<u8>,
) -> Result<Handle, Error> {
    call(|s| s.html_parse_fragment_with_uri(&data, &base_uri))
}

pub unsafe fn quill_html_select(handle: Handle, selector: Vec<u8>) -> Result<Handle, Error> {
    call(|s| s.html_select(handle, &selector))
}

pub unsafe fn quill_html_attr(handle: Handle, name: Vec<u8>) -> Result<Vec<u8>, Error> {
    call(|s| s.html_attr(handle, &name))
}

pub unsafe fn quill_html_first(handle: Handle) -> Result<Handle, Error> {
    call(|s| s.html_first(handle))
}

pub unsafe fn quill_html_last(handle: Handle) -> Result<Handle, Error> {
    call(|s| s.html_last(handle))
}

pub unsafe fn quill_html_next(handle: Handle) -> Result<Handle, Error> {
    call(|s| s.html_next(handle))
}

pub unsafe fn quill_html_previous(handle: Handle) -> Result<Handle, Error> {
    call(|s| s.html_previous(handle))
}

pub unsafe fn quill_html_base_uri(handle: Handle) -> Result<Vec<u8>, Error> {
    call(|s| s.html_base_uri(handle))
}

pub unsafe fn quill_html_body(handle: Handle) -> Result<Handle, Error> {
    call(|s| s.html_body(handle))
}

pub unsafe fn quill_html_text(handle: Handle) -> Result<Vec<u8>, Error> {
    call(|s| s.html_text(handle))
}

pub unsafe fn quill_html_own_text(handle: Handle) -> Result<Vec<u8>, Error> {
    call(|s| s.html_own_text(handle))
}

pub unsafe fn quill_html_data(handle: Handle) -> Result<Vec<u8>, Error> {
    call(|s| s.html_data(handle))
}

pub unsafe fn quill_html_array(handle: Handle) -> Result<Handle, Error> {
    call(|s| s.html_array(handle))
}

pub unsafe fn quill_html_html(handle: Handle) -> Result<Vec<u8>, Error> {
    call(|s| s.html_html(handle))
}

pub unsafe fn quill_html_outer_html(handle: Handle) -> Result<Vec<u8>, Error> {
    call(|s| s.html_outer_html(handle))
}

pub unsafe fn quill_html_id(handle: Handle) -> Result<Vec<u8>, Error> {
    call(|s| s.html_id(handle))
}

pub unsafe fn quill_html_tag_name(handle: Handle) -> Result<Vec<u8>, Error> {
    call(|s| s.html_tag_name(handle))
}

pub unsafe fn quill_html_class_name(handle: Handle) -> Result<Vec<u8>, Error> {
    call(|s| s.html_class_name(handle))
}

pub unsafe fn quill_html_has_class(handle: Handle, class: Vec<u8>) -> Result<i32, Error> {
    call(|s| s.html_has_class(handle, &class))
}

pub unsafe fn quill_html_has_attr(handle: Handle, name: Vec<u8>) -> Result<i32, Error> {
    call(|s| s.html_has_attr(handle, &name))
}

pub unsafe fn quill_net_init(method: i32) -> Result<Handle, Error> {
    call(|s| s.net_init(method))
}

pub unsafe fn quill_net_set_url(handle: Handle, url: Vec<u8>) -> Result<(), Error> {
    call(|s| s.net_set_url(handle, &url))
}

pub unsafe fn quill_net_set_header(
    handle: Handle,
    name: Vec<u8>,
    value: Vec<u8>,
) -> Result<(), Error> {
    call(|s| s.net_set_header(handle, &name, &value))
}

pub unsafe fn quill_net_set_body(handle: Handle, body: Vec<u8>) -> Result<(), Error> {
    call(|s| s.net_set_body(handle, &body))
}

pub unsafe fn quill_net_send(handle: Handle) -> Result<(), Error> {
    call(|s| s.net_send(handle))
}

pub unsafe fn quill_net_get_url(handle: Handle) -> Result<Vec<u8>, Error> {
    call(|s| s.net_get_url(handle))
}

pub unsafe fn quill_net_get_data(handle: Handle) -> Result<Vec<u8>, Error> {
    call(|s| s.net_get_data(handle))
}

pub unsafe fn quill_net_get_data_size(handle: Handle) -> Result<u32, Error> {
    call(|s| s.net_get_data_size(handle))
}

pub unsafe fn quill_net_get_status_code(handle: Handle) -> Result<i32, Error> {
    call(|s| s.net_get_status_code(handle))
}

pub unsafe fn quill_net_get_header(handle: Handle, name: Vec<u8>) -> Result<Handle, Error> {
    call(|s| s.net_get_header(handle, &name))
}

pub unsafe fn quill_net_json(handle: Handle) -> Result<Handle, Error> {
    call(|s| s.net_json(handle))
}

pub unsafe fn quill_net_html(handle: Handle) -> Result<Handle, Error> {
    call(|s| s.net_html(handle))
}

pub unsafe fn quill_net_close(handle: Handle) -> Result<(), Error> {
    call(|s| s.net_close(handle))
}

pub unsafe fn quill_net_set_rate_limit(requests: i32) -> Result<(), Error> {
    call(|s| Ok(s.net_set_rate_limit(requests)))
}

pub unsafe fn quill_net_set_rate_limit_period(seconds: i32) -> Result<(), Error> {
    call(|s| Ok(s.net_set_rate_limit_period(seconds)))
}

pub unsafe fn quill_log(level: Vec<u8>, message: Vec<u8>) -> Result<(), Error> {
    call(|s| s.log(&level, &message))
}

pub unsafe fn quill_defaults_get(key: Vec<u8>) -> Result<Handle, Error> {
    call(|s| s.defaults_get(&key))
}

pub unsafe fn quill_defaults_set(key: Vec<u8>, value: Handle) -> Result<(), Error> {
    call(|s| s.defaults_set(&key, value))
}

pub unsafe fn quill_deeplink_create(
    manga_id: Vec<u8>,
    chapter_id: Vec<u8>,
) -> Result<Handle, Error> {
    call(|s| s.deeplink_create(&manga_id, &chapter_id))
}
