//! End-to-end tests for the exported function table
//!
//! Drives the `extern "C"` surface the way a host binding would: allocate,
//! fill, pass back, and free buffers, always checking the call status the
//! host is contractually required to inspect.

use shashlik_bridge::exports::{
    shashlik_contract_version, shashlik_install_log_callback, shashlik_rustbuffer_alloc,
    shashlik_rustbuffer_free, shashlik_rustbuffer_from_bytes, shashlik_rustbuffer_reserve,
};
use shashlik_bridge::{
    BridgeBuffer, CallStatus, ForeignBytes, Lift, Lower, CALL_ERROR, CONTRACT_VERSION,
};

#[test]
fn test_contract_version_probe() {
    assert_eq!(shashlik_contract_version(), CONTRACT_VERSION);
}

#[test]
fn test_alloc_write_free_cycle() {
    let mut status = CallStatus::new();
    let mut buf = shashlik_rustbuffer_alloc(32, &mut status);
    assert!(status.is_success());
    assert!(buf.capacity >= 32);
    assert_eq!(buf.len, 0);

    // The host writes payload bytes and then updates len, exactly as the
    // generated binding does after serializing arguments.
    let payload = b"zoom=14";
    unsafe {
        std::ptr::copy_nonoverlapping(payload.as_ptr(), buf.data, payload.len());
    }
    buf.len = payload.len() as u64;
    assert_eq!(buf.try_as_slice().unwrap(), payload);

    let mut status = CallStatus::new();
    shashlik_rustbuffer_free(buf, &mut status);
    assert!(status.is_success());
}

#[test]
fn test_alloc_zero_is_empty() {
    let mut status = CallStatus::new();
    let buf = shashlik_rustbuffer_alloc(0, &mut status);
    assert!(status.is_success());
    assert!(buf.data.is_null());

    let mut status = CallStatus::new();
    shashlik_rustbuffer_free(buf, &mut status);
    assert!(status.is_success());
}

#[test]
fn test_from_bytes_copies_host_memory() {
    let host_owned = "Пресня".to_string().into_bytes();
    let bytes = ForeignBytes {
        len: host_owned.len() as i32,
        data: host_owned.as_ptr(),
    };

    let mut status = CallStatus::new();
    let buf = shashlik_rustbuffer_from_bytes(bytes, &mut status);
    assert!(status.is_success());
    assert_eq!(buf.try_as_slice().unwrap(), host_owned.as_slice());

    // The copy must be independent of the host allocation.
    drop(host_owned);
    assert_eq!(buf.len(), "Пресня".len());

    let mut status = CallStatus::new();
    shashlik_rustbuffer_free(buf, &mut status);
    assert!(status.is_success());
}

#[test]
fn test_from_bytes_negative_length_is_error() {
    let bytes = ForeignBytes {
        len: -3,
        data: std::ptr::null(),
    };
    let mut status = CallStatus::new();
    let buf = shashlik_rustbuffer_from_bytes(bytes, &mut status);
    assert_eq!(status.code, CALL_ERROR);
    assert!(buf.data.is_null());

    let message = String::try_lift(status.error_buf).unwrap();
    assert!(message.contains("negative length"));
}

#[test]
fn test_reserve_preserves_contents() {
    let data = b"route polyline".to_vec();
    let bytes = ForeignBytes {
        len: data.len() as i32,
        data: data.as_ptr(),
    };
    let mut status = CallStatus::new();
    let buf = shashlik_rustbuffer_from_bytes(bytes, &mut status);
    assert!(status.is_success());
    let old_len = buf.len;

    let mut status = CallStatus::new();
    let grown = shashlik_rustbuffer_reserve(buf, 4096, &mut status);
    assert!(status.is_success());
    assert_eq!(grown.len, old_len);
    assert!(grown.capacity >= old_len + 4096);
    assert_eq!(grown.try_as_slice().unwrap(), data.as_slice());

    let mut status = CallStatus::new();
    shashlik_rustbuffer_free(grown, &mut status);
    assert!(status.is_success());
}

#[test]
fn test_oversized_alloc_is_error_not_abort() {
    let mut status = CallStatus::new();
    let buf = shashlik_rustbuffer_alloc(u64::MAX, &mut status);
    assert_eq!(status.code, CALL_ERROR);
    assert!(buf.data.is_null());
    let message = String::try_lift(status.error_buf).unwrap();
    assert!(message.contains("maximum allocation size"));
}

#[test]
fn test_free_of_unissued_pointer_is_error() {
    let stale = BridgeBuffer {
        capacity: 64,
        len: 64,
        data: 0x5A5A_0000usize as *mut u8,
    };
    let mut status = CallStatus::new();
    shashlik_rustbuffer_free(stale, &mut status);
    assert_eq!(status.code, CALL_ERROR);
    let message = String::try_lift(status.error_buf).unwrap();
    assert!(message.contains("not a live bridge allocation"));
}

#[test]
fn test_free_with_inflated_capacity_is_error() {
    let mut status = CallStatus::new();
    let buf = shashlik_rustbuffer_alloc(16, &mut status);
    assert!(status.is_success());

    let forged = BridgeBuffer {
        capacity: buf.capacity + 4096,
        len: 0,
        data: buf.data,
    };
    let mut status = CallStatus::new();
    shashlik_rustbuffer_free(forged, &mut status);
    assert_eq!(status.code, CALL_ERROR);
    let message = String::try_lift(status.error_buf).unwrap();
    assert!(message.contains("does not match the issued allocation"));

    // The real descriptor is still valid and frees cleanly.
    let mut status = CallStatus::new();
    shashlik_rustbuffer_free(buf, &mut status);
    assert!(status.is_success());
}

#[test]
fn test_corrupted_descriptor_is_error() {
    let mut status = CallStatus::new();
    let mut buf = shashlik_rustbuffer_alloc(16, &mut status);
    assert!(status.is_success());

    buf.len = buf.capacity + 1;
    let stale = BridgeBuffer {
        capacity: buf.capacity,
        len: buf.len,
        data: buf.data,
    };
    let mut status = CallStatus::new();
    shashlik_rustbuffer_free(stale, &mut status);
    assert_eq!(status.code, CALL_ERROR);
    let message = String::try_lift(status.error_buf).unwrap();
    assert!(message.contains("exceeds capacity"));

    // Clean up with the descriptor restored.
    buf.len = 0;
    let mut status = CallStatus::new();
    shashlik_rustbuffer_free(buf, &mut status);
    assert!(status.is_success());
}

#[test]
fn test_lowered_value_lifts_on_host_side() {
    // Native side lowers a compound value; host side lifts it from the
    // returned buffer. This is the full argument/return path minus codegen.
    let waypoints = vec!["Арбат".to_string(), "Остоженка".to_string()];
    let buf = waypoints.lower();
    let lifted = Vec::<String>::try_lift(buf).unwrap();
    assert_eq!(lifted, waypoints);
}

#[test]
fn test_install_log_callback_null_detaches() {
    let mut status = CallStatus::new();
    shashlik_install_log_callback(None, 3, &mut status);
    assert!(status.is_success());
}
