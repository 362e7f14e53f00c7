//! ### English
//! GL version string parsing and GLSL header selection.
//!
//! ### 中文
//! GL 版本字符串解析与 GLSL 头选择。

/// ### English
/// Parsed `GL_VERSION`.
///
/// ### 中文
/// 解析后的 `GL_VERSION`。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct GlVersion {
    pub(super) is_gles: bool,
    pub(super) major: u32,
    pub(super) minor: u32,
}

impl GlVersion {
    /// ### English
    /// Expected forms: `"4.6.0 NVIDIA ..."` or `"OpenGL ES 3.2 ..."`.
    ///
    /// ### 中文
    /// 期望的版本字符串形式：`"4.6.0 NVIDIA ..."` 或 `"OpenGL ES 3.2 ..."`。
    pub(super) fn parse(version: &str) -> Self {
        let is_gles = version.starts_with("OpenGL ES");
        let mut major = 0u32;
        let mut minor = 0u32;
        let number_token = version
            .split_whitespace()
            .find(|token| token.starts_with(|c: char| c.is_ascii_digit()));
        if let Some(token) = number_token {
            let mut parts = token.split('.');
            if let Some(m) = parts.next().and_then(|s| s.parse::<u32>().ok()) {
                major = m;
            }
            if let Some(n) = parts.next().and_then(|s| s.parse::<u32>().ok()) {
                minor = n;
            }
        }
        Self {
            is_gles,
            major,
            minor,
        }
    }

    /// ### English
    /// Framebuffer blits, VAOs and fences are core since GL 3.2 / GLES 3.0.
    ///
    /// ### 中文
    /// framebuffer blit、VAO 与 fence 自 GL 3.2 / GLES 3.0 起为核心特性。
    pub(super) fn supports_presentation(self) -> bool {
        if self.is_gles {
            self.major >= 3
        } else {
            self.major > 3 || (self.major == 3 && self.minor >= 2)
        }
    }

    /// ### English
    /// `#version` header prepended to shader sources.
    ///
    /// ### 中文
    /// 添加在着色器源码前的 `#version` 头。
    pub(super) fn glsl_header(self) -> &'static str {
        if self.is_gles {
            "#version 300 es\nprecision mediump float;\n"
        } else if self.major > 3 || (self.major == 3 && self.minor >= 3) {
            "#version 330 core\n"
        } else {
            "#version 150\n#extension GL_ARB_explicit_attrib_location : require\n"
        }
    }
}
