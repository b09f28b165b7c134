use proptest::prelude::*;
use trust_fs::NormalizedPath;

proptest! {
    #[test]
    fn test_normalization_invariants(s in "\\PC*") {
        let path = NormalizedPath::new(&s);
        let as_str = path.as_str();

        if cfg!(windows) {
            prop_assert!(!as_str.contains('\\'));
        }
        prop_assert!(!as_str.contains("//"));
        prop_assert!(as_str == "/" || !as_str.ends_with('/'));

        // Normalizing twice changes nothing
        let again = NormalizedPath::new(path.to_native());
        prop_assert_eq!(path, again);
    }

    #[test]
    fn test_joined_child_is_within_parent(
        dir in "/[a-z]{1,8}(/[a-z]{1,8}){0,3}",
        name in "[a-z0-9.]{1,12}",
    ) {
        prop_assume!(name != "." && name != "..");
        let dir = NormalizedPath::new(&dir);
        let child = dir.join(&name);

        prop_assert!(child.is_within(&dir));
        prop_assert!(!dir.is_within(&child));
        prop_assert_eq!(child.parent(), Some(dir));
    }
}
