// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lua scripts for the atomic lease operations
//!
//! All scripts take the lock key as `KEYS[1]` and the token as `ARGV[1]`.
//! Leases are passed in milliseconds as `ARGV[2]`. Each returns 1 on success
//! and 0 otherwise.

/// Set the key unless another token holds it; re-arm it if this token does
pub const ACQUIRE: &str = r#"
local holder = redis.call('get', KEYS[1])
if holder == false then
    redis.call('set', KEYS[1], ARGV[1], 'PX', ARGV[2])
    return 1
elseif holder == ARGV[1] then
    redis.call('pexpire', KEYS[1], ARGV[2])
    return 1
end
return 0
"#;

/// Delete the key only while it holds this token
pub const RELEASE: &str = r#"
if redis.call('get', KEYS[1]) == ARGV[1] then
    return redis.call('del', KEYS[1])
end
return 0
"#;

/// Reset the TTL only while the key holds this token
pub const EXTEND: &str = r#"
if redis.call('get', KEYS[1]) == ARGV[1] then
    return redis.call('pexpire', KEYS[1], ARGV[2])
end
return 0
"#;
