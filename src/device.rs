use rand::Rng;
use reqwest::header::HeaderValue;

/// 设备标识长度
pub const DEVICE_ID_LENGTH: usize = 8;

const DEVICE_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// 生成模拟客户端安装的设备标识：8 个大小写拉丁字母，逐位独立均匀抽取。
///
/// 不用作凭据，只需保证服务不会把无关的上传混为一谈（52^8 的空间足够）。
pub fn generate_device_id() -> String {
    let mut rng = rand::thread_rng();
    (0..DEVICE_ID_LENGTH)
        .map(|_| DEVICE_ID_ALPHABET[rng.gen_range(0..DEVICE_ID_ALPHABET.len())] as char)
        .collect()
}

/// 重建句柄时传入的设备标识只要求非空且可作为请求头值
pub fn is_valid_device_id(device_id: &str) -> bool {
    !device_id.is_empty() && HeaderValue::from_str(device_id).is_ok()
}
