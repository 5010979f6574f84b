/// Garden Linux source repository constants
pub mod repo {
    /// Git repository of Garden Linux, also the OCM component name
    pub const GARDENLINUX: &str = "github.com/gardenlinux/gardenlinux";

    /// Browsable URL of the Garden Linux repository
    pub const GARDENLINUX_URL: &str = "https://github.com/gardenlinux/gardenlinux";
}

/// Well-known release file suffixes
pub mod suffix {
    /// Root filesystem tarball
    pub const ROOTFS: &str = ".tar";

    /// Package manifest listing `name version` pairs
    pub const PACKAGE_MANIFEST: &str = ".manifest";
}

/// OCM label names
pub mod label {
    pub const BUILD_METADATA: &str = "gardener.cloud/gardenlinux/ci/build-metadata";
    pub const PUBLISHED_IMAGE_METADATA: &str =
        "gardener.cloud/gardenlinux/ci/published-image-metadata";
    pub const PACKAGE_VERSIONS: &str = "cloud.cnudie/dso/scanning-hints/package-versions";
    pub const SOURCE_ANALYSIS: &str =
        "cloud.gardener.cnudie/dso/scanning-hints/source_analysis/v1";
    pub const RESPONSIBLES: &str = "cloud.gardener.cnudie/responsibles";
}

/// OCM resource constants
pub mod resource {
    /// Name of the virtual machine image resource
    pub const IMAGE_NAME: &str = "gardenlinux";

    /// Type of the virtual machine image resource
    pub const IMAGE_TYPE: &str = "virtual_machine_image";

    /// Name of the root filesystem resource
    pub const ROOTFS_NAME: &str = "rootfs";

    /// Type of the root filesystem resource
    pub const ROOTFS_TYPE: &str = "application/tar+vm-image-rootfs";

    /// Placeholder for images, which are not content-addressed
    pub const NO_DIGEST: &str = "NO-DIGEST";

    /// Normalisation marker excluding a resource from signing
    pub const EXCLUDE_FROM_SIGNATURE: &str = "EXCLUDE-FROM-SIGNATURE";
}

/// OCM component constants
pub mod component {
    pub const SCHEMA_VERSION: &str = "v2";
    pub const PROVIDER: &str = "sap-se";
    pub const SOURCE_NAME: &str = "gardenlinux";

    /// Contacts listed as responsible for the rootfs resource
    pub const RESPONSIBLES: [&str; 2] = ["andre.russ@sap.com", "v.riesop@sap.com"];
}

/// Release manifest storage
pub mod storage {
    /// Prefix under which single-flavor release manifests live
    pub const MANIFEST_PREFIX: &str = "meta/singles";

    /// Number of commit characters used in manifest paths
    pub const SHORT_COMMIT_LEN: usize = 8;
}
