//! ### English
//! Textured-quad program used for every composite layer.
//!
//! ### 中文
//! 所有合成层共用的纹理四边形 program。

pub const MVP_UNIFORM: &str = "mvp";
pub const ALPHA_UNIFORM: &str = "alpha";

pub const QUAD_VERTEX_SHADER: &str = r#"
layout(location = 0) in vec2 position;
layout(location = 1) in vec2 texcoord;

uniform mat4 mvp;

out vec2 v_texcoord;

void main() {
    v_texcoord = texcoord;
    gl_Position = mvp * vec4(position, 0.0, 1.0);
}
"#;

pub const QUAD_FRAGMENT_SHADER: &str = r#"
uniform sampler2D sampler;
uniform float alpha;

in vec2 v_texcoord;

out vec4 frag_color;

void main() {
    vec4 color = texture(sampler, v_texcoord);
    frag_color = vec4(color.rgb, color.a * alpha);
}
"#;
