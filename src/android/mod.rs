// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! NDK image-reader backend and the JNI surface of the library.

mod entry;
mod logcat;
mod reader;

pub use entry::{
    Java_com_example_lazyshot_CameraRepository_createNativeImageReader,
    Java_com_example_lazyshot_MainActivity_stringFromJNI,
};
pub use reader::{NdkBackend, NdkImage, NdkReader, NdkWindow};
