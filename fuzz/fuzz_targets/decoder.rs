#![no_main]

use std::sync::{Arc, OnceLock};

use ilscope::{
    disassembler::Decoder,
    metadata::{
        FieldInfo, Member, MethodInfo, ScopeEntry, ScopeTokenResolver, Token, TokenKind,
        TokenResolver, TypeInfo,
    },
    Error, Result,
};
use libfuzzer_sys::fuzz_target;
use widestring::U16String;

/// Scope that reports `ldtoken` operands from foreign tables as resolution errors.
///
/// `as_member` panics on such tokens, and a panic aborts the fuzzer, so random bytes would
/// otherwise stop every run at the first stray `ldtoken`.
struct FuzzResolver {
    scope: ScopeTokenResolver,
}

impl TokenResolver for FuzzResolver {
    fn as_field(&self, token: Token) -> Result<FieldInfo> {
        self.scope.as_field(token)
    }

    fn as_method(&self, token: Token) -> Result<MethodInfo> {
        self.scope.as_method(token)
    }

    fn as_signature(&self, token: Token) -> Result<Vec<u8>> {
        self.scope.as_signature(token)
    }

    fn as_string(&self, token: Token) -> Result<U16String> {
        self.scope.as_string(token)
    }

    fn as_type(&self, token: Token) -> Result<TypeInfo> {
        self.scope.as_type(token)
    }

    fn as_member(&self, token: Token) -> Result<Member> {
        match token.kind() {
            Some(TokenKind::TypeDef | TokenKind::MethodDef | TokenKind::FieldDef) => {
                self.scope.as_member(token)
            }
            _ => Err(Error::Resolution {
                token,
                expected: "member",
            }),
        }
    }
}

fn resolver() -> Arc<FuzzResolver> {
    static RESOLVER: OnceLock<Arc<FuzzResolver>> = OnceLock::new();
    RESOLVER
        .get_or_init(|| {
            let scope = ScopeTokenResolver::new();
            scope.add_string("fuzz");
            scope.add_signature(vec![0x00, 0x00, 0x01]);
            scope.add_type(TypeInfo::new("System.Object"));
            scope.add_field(FieldInfo::new("Fuzz", "System.Int32", "field"));
            scope.add_method(MethodInfo::new("Fuzz", "Void", "Method", ["System.Int32"]));
            scope.push(ScopeEntry::GenericMethod {
                method: MethodInfo::new("Box`1", "T", "Get", Vec::<String>::new()),
                context: TypeInfo::new("Box`1[System.Int32]"),
            });
            Arc::new(FuzzResolver { scope })
        })
        .clone()
}

fuzz_target!(|data: &[u8]| {
    let mut decoder = Decoder::new(data.to_vec(), resolver());
    let Ok(instructions) = decoder.decode_all() else {
        return;
    };

    for instruction in &instructions {
        let _ = instruction.raw_operand();
        let _ = instruction.targets();
        let _ = instruction.to_string();
    }
});
