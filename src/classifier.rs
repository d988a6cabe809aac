pub const PACKAGE_GMS: &str = "com.google.android.gms";
pub const PROCESS_GMS_UNSTABLE: &str = "com.google.android.gms.unstable";
pub const PACKAGE_ARCORE: &str = "com.google.ar.core";
pub const PACKAGE_SETTINGS_INTELLIGENCE: &str = "com.google.android.settings.intelligence";

const GOOGLE_CAMERA_MARKER: &str = "GoogleCamera";

/// Consumer apps that see the most recent Pixel.
pub const PIXEL_APP_PACKAGES: [&str; 30] = [
    "com.amazon.avod.thirdpartyclient",
    "com.android.chrome",
    "com.breel.wallpapers20",
    "com.disney.disneyplus",
    "com.google.android.aicore",
    "com.google.android.apps.accessibility.magnifier",
    "com.google.android.apps.aiwallpapers",
    "com.google.android.apps.bard",
    "com.google.android.apps.customization.pixel",
    "com.google.android.apps.emojiwallpaper",
    "com.google.android.apps.nexuslauncher",
    "com.google.android.apps.pixel.agent",
    "com.google.android.apps.pixel.creativeassistant",
    "com.google.android.apps.pixel.support",
    "com.google.android.apps.privacy.wildlife",
    "com.google.android.apps.subscriptions.red",
    "com.google.android.apps.wallpaper",
    "com.google.android.apps.wallpaper.pixel",
    "com.google.android.apps.weather",
    "com.google.android.gms",
    "com.google.android.googlequicksearchbox",
    "com.google.android.soundpicker",
    "com.google.android.wallpaper.effects",
    "com.google.pixel.livewallpaper",
    "com.microsoft.android.smsorganizer",
    "com.nhs.online.nhsonline",
    "com.nothing.smartcenter",
    "com.realme.link",
    "in.startv.hotstar",
    "jp.id_credit_sp2.android",
];

pub const CUSTOM_CAMERA_PACKAGES: [&str; 3] = [
    "com.google.android.MTCL83",
    "com.google.android.UltraCVM",
    "com.google.android.apps.cameralite",
];

/// Codenames of Pixels Google currently supports.
pub const PIXEL_CODENAMES: [&str; 20] = [
    "rango",
    "mustang",
    "blazer",
    "frankel",
    "komodo",
    "caiman",
    "tokay",
    "comet",
    "akita",
    "husky",
    "shiba",
    "felix",
    "tangorpro",
    "lynx",
    "cheetah",
    "panther",
    "bluejay",
    "oriole",
    "raven",
    "barbet",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallerIdentity {
    pub package_name: String,
    pub process_name: String,
}

impl CallerIdentity {
    pub fn new(package_name: impl Into<String>, process_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            process_name: process_name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallerCategory {
    /// The trusted services package running its unstable worker.
    PrivilegedServiceProcess,
    /// Camera apps are never spoofed.
    ExcludedCameraApp,
    PixelAppPackage,
    Other,
}

impl CallerCategory {
    pub fn is_excluded(self) -> bool {
        self == CallerCategory::ExcludedCameraApp
    }
}

pub fn classify(package_name: &str, process_name: &str) -> CallerCategory {
    if package_name.is_empty() || process_name.is_empty() {
        return CallerCategory::Other;
    }
    if is_google_camera_package(package_name) {
        return CallerCategory::ExcludedCameraApp;
    }
    if is_privileged_worker(package_name, process_name) {
        return CallerCategory::PrivilegedServiceProcess;
    }
    if PIXEL_APP_PACKAGES.contains(&package_name) {
        return CallerCategory::PixelAppPackage;
    }
    CallerCategory::Other
}

pub fn classify_identity(caller: &CallerIdentity) -> CallerCategory {
    classify(&caller.package_name, &caller.process_name)
}

pub fn is_privileged_worker(package_name: &str, process_name: &str) -> bool {
    package_name == PACKAGE_GMS && process_name == PROCESS_GMS_UNSTABLE
}

pub fn is_google_camera_package(package_name: &str) -> bool {
    package_name.contains(GOOGLE_CAMERA_MARKER) || CUSTOM_CAMERA_PACKAGES.contains(&package_name)
}

pub fn is_supported_pixel_codename(codename: &str) -> bool {
    PIXEL_CODENAMES.contains(&codename)
}
