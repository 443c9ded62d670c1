use extism_pdk::*;

use super::Handle;

#[host_fn]
extern "ExtismHost" {
    // -----------------------------------------------------------------------
    // Values
    // -----------------------------------------------------------------------
    /// Create a Null value.
    pub fn quill_value_create_null() -> Handle;
    /// Create an empty Array value.
    pub fn quill_value_create_array() -> Handle;
    /// Create an empty Object value.
    pub fn quill_value_create_object() -> Handle;
    /// Create a String value from UTF-8 bytes.
    pub fn quill_value_create_string(value: Vec<u8>) -> Handle;
    /// Create a Bool value.
    pub fn quill_value_create_bool(value: i32) -> Handle;
    /// Create an Int value.
    pub fn quill_value_create_int(value: i64) -> Handle;
    /// Create a Float value.
    pub fn quill_value_create_float(value: f64) -> Handle;
    /// Create a Date value from epoch milliseconds.
    pub fn quill_value_create_date(millis: f64) -> Handle;

    /// Kind code of a resource.
    pub fn quill_value_type_of(handle: Handle) -> i32;
    pub fn quill_value_read_bool(handle: Handle) -> i32;
    pub fn quill_value_read_int(handle: Handle) -> i64;
    pub fn quill_value_read_float(handle: Handle) -> f64;
    pub fn quill_value_read_string(handle: Handle) -> Vec<u8>;
    /// Byte length of a String value.
    pub fn quill_value_read_string_len(handle: Handle) -> u32;
    /// Epoch milliseconds of a Date value.
    pub fn quill_value_read_date(handle: Handle) -> f64;
    /// Parse a String value as a date.
    pub fn quill_value_read_date_string(
        handle: Handle,
        format: Vec<u8>,
        locale: Vec<u8>,
        time_zone: Vec<u8>,
    ) -> f64;

    /// Deep copy into a new handle.
    pub fn quill_value_copy(handle: Handle) -> Handle;
    /// Release a value or HTML handle.
    pub fn quill_value_destroy(handle: Handle);

    // -----------------------------------------------------------------------
    // Arrays & Objects
    // -----------------------------------------------------------------------
    pub fn quill_array_len(handle: Handle) -> u32;
    pub fn quill_array_get(handle: Handle, index: u32) -> Handle;
    pub fn quill_array_set(handle: Handle, index: u32, value: Handle);
    pub fn quill_array_append(handle: Handle, value: Handle);
    pub fn quill_array_remove(handle: Handle, index: u32);

    pub fn quill_object_len(handle: Handle) -> u32;
    /// Member at `key`; a Null value when missing.
    pub fn quill_object_get(handle: Handle, key: Vec<u8>) -> Handle;
    pub fn quill_object_set(handle: Handle, key: Vec<u8>, value: Handle);
    pub fn quill_object_remove(handle: Handle, key: Vec<u8>);
    /// Array of member names.
    pub fn quill_object_keys(handle: Handle) -> Handle;
    /// Array of members, in the same order as the keys.
    pub fn quill_object_values(handle: Handle) -> Handle;

    /// Parse JSON; invalid input yields a Null value.
    pub fn quill_json_parse(data: Vec<u8>) -> Handle;

    // -----------------------------------------------------------------------
    // HTML
    // -----------------------------------------------------------------------
    pub fn quill_html_parse(data: Vec<u8>) -> Handle;
    pub fn quill_html_parse_with_uri(data: Vec<u8>, base_uri: Vec<u8>) -> Handle;
    pub fn quill_html_parse_fragment(data: Vec<u8>) -> Handle;
    pub fn quill_html_parse_fragment_with_uri(data: Vec<u8>, base_uri: Vec<u8>) -> Handle;
    /// Run a CSS selector against a document, element or node-set.
    pub fn quill_html_select(handle: Handle, selector: Vec<u8>) -> Handle;
    pub fn quill_html_attr(handle: Handle, name: Vec<u8>) -> Vec<u8>;
    pub fn quill_html_first(handle: Handle) -> Handle;
    pub fn quill_html_last(handle: Handle) -> Handle;
    pub fn quill_html_next(handle: Handle) -> Handle;
    pub fn quill_html_previous(handle: Handle) -> Handle;
    pub fn quill_html_base_uri(handle: Handle) -> Vec<u8>;
    pub fn quill_html_body(handle: Handle) -> Handle;
    pub fn quill_html_text(handle: Handle) -> Vec<u8>;
    pub fn quill_html_own_text(handle: Handle) -> Vec<u8>;
    pub fn quill_html_data(handle: Handle) -> Vec<u8>;
    /// Array of single-element Node values.
    pub fn quill_html_array(handle: Handle) -> Handle;
    pub fn quill_html_html(handle: Handle) -> Vec<u8>;
    pub fn quill_html_outer_html(handle: Handle) -> Vec<u8>;
    pub fn quill_html_id(handle: Handle) -> Vec<u8>;
    pub fn quill_html_tag_name(handle: Handle) -> Vec<u8>;
    pub fn quill_html_class_name(handle: Handle) -> Vec<u8>;
    pub fn quill_html_has_class(handle: Handle, class: Vec<u8>) -> i32;
    pub fn quill_html_has_attr(handle: Handle, name: Vec<u8>) -> i32;

    // -----------------------------------------------------------------------
    // Network
    // -----------------------------------------------------------------------
    /// Create a request. Methods: 0 GET, 1 POST, 2 PUT, 3 DELETE, 4 HEAD.
    pub fn quill_net_init(method: i32) -> Handle;
    pub fn quill_net_set_url(handle: Handle, url: Vec<u8>);
    pub fn quill_net_set_header(handle: Handle, name: Vec<u8>, value: Vec<u8>);
    pub fn quill_net_set_body(handle: Handle, body: Vec<u8>);
    /// Send the request. At most once per handle.
    pub fn quill_net_send(handle: Handle);
    pub fn quill_net_get_url(handle: Handle) -> Vec<u8>;
    pub fn quill_net_get_data(handle: Handle) -> Vec<u8>;
    pub fn quill_net_get_data_size(handle: Handle) -> u32;
    pub fn quill_net_get_status_code(handle: Handle) -> i32;
    /// Response header as a String value, or Null.
    pub fn quill_net_get_header(handle: Handle, name: Vec<u8>) -> Handle;
    pub fn quill_net_json(handle: Handle) -> Handle;
    pub fn quill_net_html(handle: Handle) -> Handle;
    /// Release a request handle.
    pub fn quill_net_close(handle: Handle);
    pub fn quill_net_set_rate_limit(requests: i32);
    pub fn quill_net_set_rate_limit_period(seconds: i32);

    // -----------------------------------------------------------------------
    // Logging, Defaults & Deep Links
    // -----------------------------------------------------------------------
    /// Log a message to the host journal.
    pub fn quill_log(level: Vec<u8>, message: Vec<u8>);
    pub fn quill_defaults_get(key: Vec<u8>) -> Handle;
    pub fn quill_defaults_set(key: Vec<u8>, value: Handle);
    pub fn quill_deeplink_create(manga_id: Vec<u8>, chapter_id: Vec<u8>) -> Handle;
}
