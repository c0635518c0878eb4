pub const IMAGE_DIAGNOSIS: &str = include_str!("../data/prompts/image_diagnosis.txt");
pub const FARMER_SYSTEM: &str = include_str!("../data/prompts/farmer_system.txt");
