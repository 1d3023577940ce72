/// 图片上传 / 滤镜协议
pub mod photo;
