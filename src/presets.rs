// ============================================================================
// PRESETS — ratio, size, and prompt-vocabulary tables offered to the UI
// ============================================================================

/// Most history records kept by a store before the oldest are trimmed.
pub const MAX_HISTORY_SIZE: usize = 50;

/// Most style-reference images accepted alongside a base image.
pub const MAX_REFERENCE_IMAGES: usize = 8;

/// Output image count bounds per generation request.
pub const MIN_IMAGE_COUNT: u8 = 1;
pub const MAX_IMAGE_COUNT: u8 = 4;

/// One selectable aspect ratio. `native` marks ratios the text-to-image
/// model accepts directly; everything else maps through the
/// closest-supported fallback.
#[derive(Clone, Copy, Debug)]
pub struct RatioOption {
    pub value: &'static str,
    pub label: &'static str,
    pub native: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct RatioGroup {
    pub group: &'static str,
    pub options: &'static [RatioOption],
}

pub static ASPECT_RATIO_OPTIONS: &[RatioGroup] = &[
    RatioGroup {
        group: "Common",
        options: &[
            RatioOption { value: "1:1", label: "1:1 (Square)", native: true },
            RatioOption { value: "16:9", label: "16:9 (Widescreen)", native: true },
            RatioOption { value: "9:16", label: "9:16 (Tall)", native: true },
            RatioOption { value: "4:3", label: "4:3 (Standard)", native: true },
            RatioOption { value: "3:4", label: "3:4 (Portrait)", native: true },
            RatioOption { value: "3:2", label: "3:2 (Classic)", native: false },
        ],
    },
    RatioGroup {
        group: "Photography & Print",
        options: &[
            RatioOption { value: "5:4", label: "5:4 (Print)", native: false },
            RatioOption { value: "7:5", label: "7:5 (Photo)", native: false },
            RatioOption { value: "3:2", label: "3:2 (35mm Film)", native: false },
            RatioOption { value: "8.5:11", label: "8.5:11 (Letter)", native: false },
            RatioOption { value: "1:1.414", label: "A4 (ISO)", native: false },
        ],
    },
    RatioGroup {
        group: "Cinema & Video",
        options: &[
            RatioOption { value: "4:3", label: "4:3 (Old TV)", native: true },
            RatioOption { value: "1.37:1", label: "1.37:1 (Academy)", native: false },
            RatioOption { value: "1.43:1", label: "1.43:1 (IMAX)", native: false },
            RatioOption { value: "1.66:1", label: "1.66:1 (European)", native: false },
            RatioOption { value: "16:9", label: "16:9 (HDTV)", native: true },
            RatioOption { value: "1.85:1", label: "1.85:1 (Cinema)", native: false },
            RatioOption { value: "2.39:1", label: "2.39:1 (Scope)", native: false },
            RatioOption { value: "2.76:1", label: "2.76:1 (UltraPan)", native: false },
        ],
    },
    RatioGroup {
        group: "Social Media",
        options: &[
            RatioOption { value: "1:1", label: "1:1 (Insta Post)", native: true },
            RatioOption { value: "4:5", label: "4:5 (Insta Portrait)", native: false },
            RatioOption { value: "9:16", label: "9:16 (Stories/Reels)", native: true },
            RatioOption { value: "16:9", label: "16:9 (Video)", native: true },
        ],
    },
    RatioGroup {
        group: "Screens & Displays",
        options: &[
            RatioOption { value: "5:4", label: "5:4 (Monitor)", native: false },
            RatioOption { value: "16:10", label: "16:10 (Laptop)", native: false },
            RatioOption { value: "21:9", label: "21:9 (Ultrawide)", native: false },
            RatioOption { value: "32:9", label: "32:9 (Superwide)", native: false },
        ],
    },
];

/// One selectable output size: `"auto"` or an exact `"WxH"` value.
#[derive(Clone, Copy, Debug)]
pub struct SizeOption {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Clone, Copy, Debug)]
pub struct SizeGroup {
    pub group: &'static str,
    pub options: &'static [SizeOption],
}

pub static IMAGE_SIZE_OPTIONS: &[SizeGroup] = &[
    SizeGroup {
        group: "General",
        options: &[SizeOption { value: "auto", label: "Auto (Based on Aspect Ratio)" }],
    },
    SizeGroup {
        group: "Icons",
        options: &[
            SizeOption { value: "16x16", label: "Favicon (16x16)" },
            SizeOption { value: "32x32", label: "Favicon (32x32)" },
            SizeOption { value: "180x180", label: "App Icon - iOS (180x180)" },
            SizeOption { value: "192x192", label: "App Icon - Android (192x192)" },
            SizeOption { value: "512x512", label: "App Store Icon (512x512)" },
        ],
    },
    SizeGroup {
        group: "Passport & ID",
        options: &[
            SizeOption { value: "600x600", label: "US Passport (2x2 inch)" },
            SizeOption { value: "413x531", label: "Schengen Visa (35x45 mm)" },
            SizeOption { value: "591x827", label: "Canada Passport (50x70 mm)" },
        ],
    },
    SizeGroup {
        group: "Web & Digital",
        options: &[
            SizeOption { value: "1920x1080", label: "Hero Image (1920x1080)" },
            SizeOption { value: "1200x630", label: "Blog / Facebook Post (1200x630)" },
            SizeOption { value: "1080x1080", label: "Instagram Post - Square (1080x1080)" },
            SizeOption { value: "1080x1350", label: "Instagram Post - Portrait (1080x1350)" },
            SizeOption { value: "1600x900", label: "Twitter Post (1600x900)" },
            SizeOption { value: "1000x1500", label: "Pinterest Pin (1000x1500)" },
            SizeOption { value: "1584x396", label: "LinkedIn Cover (1584x396)" },
            SizeOption { value: "800x200", label: "Email Banner (800x200)" },
        ],
    },
    SizeGroup {
        group: "Print (300 DPI)",
        options: &[
            SizeOption { value: "1200x1800", label: "4x6 inches" },
            SizeOption { value: "1500x2100", label: "5x7 inches" },
            SizeOption { value: "2400x3000", label: "8x10 inches" },
            SizeOption { value: "2480x3508", label: "A4 Paper" },
            SizeOption { value: "2550x3300", label: "Letter Paper (US)" },
        ],
    },
];

pub static LIGHTING_OPTIONS: &[&str] = &[
    "Studio",
    "Natural",
    "Golden Hour",
    "Blue Hour",
    "Dramatic",
    "Cinematic",
    "Backlit",
    "Soft",
    "High-Key",
    "Low-Key",
];

pub static CAMERA_PERSPECTIVE_OPTIONS: &[&str] = &[
    "Eye-Level",
    "High-Angle",
    "Low-Angle",
    "Bird's-Eye View",
    "Worm's-Eye View",
    "Dutch Angle",
    "Over-the-Shoulder",
    "Close-up",
    "Macro",
    "Wide-Angle",
];
