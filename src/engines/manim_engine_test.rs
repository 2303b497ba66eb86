#[cfg(test)]
mod tests {
    use crate::engines::manim_engine::{clean_manim_code, find_generated_file};
    use uuid::Uuid;

    #[test]
    fn test_clean_code_adds_missing_imports() {
        let code = "class Demo(Scene):\n    def construct(self):\n        pass";
        let cleaned = clean_manim_code(code, "#000000");
        assert!(cleaned.starts_with("from manim import *"));
        assert!(cleaned.contains("import numpy as np"));
    }

    #[test]
    fn test_clean_code_keeps_existing_imports() {
        let code = "from manim import *\n\nclass Demo(Scene):\n    def construct(self):\n        pass";
        let cleaned = clean_manim_code(code, "#000000");
        assert_eq!(cleaned.matches("from manim import *").count(), 1);
    }

    #[test]
    fn test_clean_code_wraps_bare_code_in_scene() {
        let code = "circle = Circle()\nself.play(Create(circle))";
        let cleaned = clean_manim_code(code, "#112233");
        assert!(cleaned.contains("class GeneratedAnimation(Scene):"));
        assert!(cleaned.contains("def construct(self):"));
        assert!(cleaned.contains("self.camera.background_color = \"#112233\""));
        assert!(cleaned.contains("        circle = Circle()"));
    }

    #[test]
    fn test_clean_code_injects_background_color_into_construct() {
        let code =
            "from manim import *\n\nclass Demo(Scene):\n    def construct(self):\n        pass";
        let cleaned = clean_manim_code(code, "#ABCDEF");

        let construct_pos = cleaned.find("def construct(self):").unwrap();
        let bg_pos = cleaned
            .find("self.camera.background_color = \"#ABCDEF\"")
            .unwrap();
        assert!(bg_pos > construct_pos);
    }

    #[test]
    fn test_clean_code_respects_existing_background_color() {
        let code = "from manim import *\n\nclass Demo(Scene):\n    def construct(self):\n        self.camera.background_color = \"#FFFFFF\"";
        let cleaned = clean_manim_code(code, "#000000");
        assert!(!cleaned.contains("#000000"));
    }

    #[test]
    fn test_find_generated_file_exact_name() {
        let dir = tempfile::tempdir().unwrap();
        let task_id = Uuid::new_v4();
        let expected = dir.path().join(format!("animation_{}.mp4", task_id));
        std::fs::write(&expected, b"video").unwrap();

        let found = find_generated_file(dir.path(), task_id).unwrap();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_find_generated_file_in_quality_subdir() {
        let dir = tempfile::tempdir().unwrap();
        let task_id = Uuid::new_v4();
        let subdir = dir.path().join("videos").join("720p30");
        std::fs::create_dir_all(&subdir).unwrap();
        let nested = subdir.join(format!("animation_{}.mp4", task_id));
        std::fs::write(&nested, b"video").unwrap();

        let found = find_generated_file(dir.path(), task_id).unwrap();
        assert_eq!(found, nested);
    }

    #[test]
    fn test_find_generated_file_prefers_id_match() {
        let dir = tempfile::tempdir().unwrap();
        let task_id = Uuid::new_v4();
        std::fs::write(dir.path().join("other.mp4"), b"other").unwrap();
        let named = dir.path().join(format!("scene_{}_final.mp4", task_id));
        std::fs::write(&named, b"video").unwrap();

        let found = find_generated_file(dir.path(), task_id).unwrap();
        assert_eq!(found, named);
    }

    #[test]
    fn test_find_generated_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_generated_file(dir.path(), Uuid::new_v4()).is_none());
    }
}
